//! Numeric section rendering: fixed point, percent, scientific, fractions

use super::{Placeholder, Token};

/// Render a non-negative magnitude through one tokenized section.
///
/// The sign is handled by the caller. Returns `None` when the section is a
/// text section (`@`) or otherwise has no numeric rendering.
pub(super) fn format_section(value: f64, tokens: &[Token]) -> Option<String> {
    if tokens.iter().any(|t| matches!(t, Token::Text)) {
        return None;
    }

    let percents = tokens.iter().filter(|t| matches!(t, Token::Percent)).count();
    let value = value * 100f64.powi(percents as i32);

    if tokens.iter().any(|t| matches!(t, Token::General)) {
        return Some(
            tokens
                .iter()
                .map(|t| match t {
                    Token::General => general(value),
                    other => literal_text(other),
                })
                .collect(),
        );
    }

    let Some(start) = tokens.iter().position(is_placeholder) else {
        return Some(tokens.iter().map(literal_text).collect());
    };
    let mut end = tokens.iter().rposition(is_placeholder).map_or(start, |i| i + 1);
    while matches!(tokens.get(end), Some(Token::Comma) | Some(Token::Point)) {
        end += 1;
    }

    let prefix: String = tokens[..start].iter().map(literal_text).collect();
    let suffix: String = tokens[end..].iter().map(literal_text).collect();
    let body = &tokens[start..end];

    let rendered = if body.iter().any(|t| matches!(t, Token::Slash)) {
        fraction(value, body)?
    } else if body.iter().any(|t| matches!(t, Token::Exponent { .. })) {
        scientific(value, body)
    } else {
        fixed(value, body)
    };

    Some(format!("{}{}{}", prefix, rendered, suffix))
}

fn is_placeholder(token: &Token) -> bool {
    matches!(token, Token::Digit(_) | Token::Denominator(_))
}

fn literal_text(token: &Token) -> String {
    match token {
        Token::Literal(s) => s.clone(),
        Token::Point => ".".into(),
        Token::Comma => ",".into(),
        Token::Percent => "%".into(),
        Token::Slash => "/".into(),
        Token::Denominator(d) => d.to_string(),
        Token::Exponent { plus } => (if *plus { "E+" } else { "E-" }).into(),
        _ => String::new(),
    }
}

/// Display of a number under the `General` token
fn general(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.10}", value);
    let text = text.trim_end_matches('0');
    text.trim_end_matches('.').to_string()
}

fn digit_count(tokens: &[Token]) -> usize {
    tokens.iter().filter(|t| matches!(t, Token::Digit(_))).count()
}

/// Round half away from zero to `places` decimals and return the digits
fn round_to(value: f64, places: usize) -> String {
    let factor = 10f64.powi(places as i32);
    let scaled = (value * factor).round() / factor;
    format!("{:.*}", places, scaled)
}

/// Fixed-point rendering with grouping and scaling commas
fn fixed(value: f64, body: &[Token]) -> String {
    let point = body.iter().position(|t| matches!(t, Token::Point));
    let (int_tokens, frac_tokens) = match point {
        Some(p) => (&body[..p], &body[p + 1..]),
        None => (body, &body[body.len()..]),
    };

    // commas after the last integer placeholder divide by 1000 each
    let last_int_digit = int_tokens.iter().rposition(|t| matches!(t, Token::Digit(_)));
    let scale_commas = match last_int_digit {
        Some(last) => int_tokens[last + 1..]
            .iter()
            .filter(|t| matches!(t, Token::Comma))
            .count(),
        None => 0,
    } + frac_tokens
        .iter()
        .rev()
        .take_while(|t| matches!(t, Token::Comma))
        .count();
    let grouping = last_int_digit.is_some_and(|last| {
        int_tokens[..last]
            .iter()
            .any(|t| matches!(t, Token::Comma))
    });

    let value = value / 1000f64.powi(scale_commas as i32);
    let places = digit_count(frac_tokens);
    let digits = round_to(value, places);
    let (int_digits, frac_digits) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let min_int = int_tokens
        .iter()
        .filter(|t| matches!(t, Token::Digit(Placeholder::Zero)))
        .count();
    let int_digits = if int_digits == "0" && min_int == 0 {
        ""
    } else {
        int_digits
    };

    let mut out = fill_integer(int_tokens, int_digits, grouping);
    if point.is_some() {
        out.push('.');
        out.push_str(&fill_fraction(frac_tokens, frac_digits));
    }
    out
}

/// Fill integer placeholders right to left; the left-most one takes any overflow
fn fill_integer(tokens: &[Token], digits: &str, grouping: bool) -> String {
    let leftmost = tokens.iter().position(|t| matches!(t, Token::Digit(_)));
    let mut remaining = digits.chars().rev();
    let mut out: Vec<char> = Vec::new();
    let mut emitted = 0usize;

    let mut push_digit = |out: &mut Vec<char>, d: char| {
        if grouping && emitted > 0 && emitted % 3 == 0 {
            out.push(',');
        }
        out.push(d);
        emitted += 1;
    };

    for (idx, token) in tokens.iter().enumerate().rev() {
        match token {
            Token::Digit(placeholder) => {
                let mut filled = false;
                if Some(idx) == leftmost {
                    for d in remaining.by_ref() {
                        push_digit(&mut out, d);
                        filled = true;
                    }
                } else if let Some(d) = remaining.next() {
                    push_digit(&mut out, d);
                    filled = true;
                }
                if !filled {
                    match placeholder {
                        Placeholder::Zero => push_digit(&mut out, '0'),
                        Placeholder::Question => out.push(' '),
                        Placeholder::Hash => {}
                    }
                }
            }
            Token::Comma => {}
            other => out.extend(literal_text(other).chars().rev()),
        }
    }

    let rendered: String = out.iter().rev().collect();
    match leftmost {
        Some(_) => rendered,
        None => format!("{}{}", digits, rendered),
    }
}

/// Fill fraction placeholders left to right
fn fill_fraction(tokens: &[Token], digits: &str) -> String {
    let digits: Vec<char> = digits.chars().collect();
    let mut out = String::new();
    let mut pos = 0;

    for token in tokens {
        match token {
            Token::Digit(placeholder) => {
                let d = digits.get(pos).copied().unwrap_or('0');
                let rest_zero = digits[pos.min(digits.len())..].iter().all(|&c| c == '0');
                pos += 1;
                match placeholder {
                    Placeholder::Zero => out.push(d),
                    Placeholder::Hash if rest_zero => {}
                    Placeholder::Question if rest_zero => out.push(' '),
                    _ => out.push(d),
                }
            }
            Token::Comma => {}
            other => out.push_str(&literal_text(other)),
        }
    }
    out
}

/// Scientific notation; several integer placeholders select engineering steps
fn scientific(value: f64, body: &[Token]) -> String {
    let split = body
        .iter()
        .position(|t| matches!(t, Token::Exponent { .. }))
        .unwrap_or(body.len());
    let plus = matches!(body.get(split), Some(Token::Exponent { plus: true }));
    let mantissa_tokens = &body[..split];
    let exp_width = digit_count(&body[(split + 1).min(body.len())..]).max(1);

    let point = mantissa_tokens
        .iter()
        .position(|t| matches!(t, Token::Point))
        .unwrap_or(mantissa_tokens.len());
    let int_places = digit_count(&mantissa_tokens[..point]).max(1) as i32;
    let frac_places = digit_count(&mantissa_tokens[point..]);
    let step = if int_places > 1 { int_places } else { 1 };

    let (mut mantissa, mut exponent) = if value == 0.0 {
        (0.0, 0)
    } else {
        let exponent = (value.log10().floor() as i32).div_euclid(step) * step;
        (value / 10f64.powi(exponent), exponent)
    };

    let factor = 10f64.powi(frac_places as i32);
    mantissa = (mantissa * factor).round() / factor;
    if mantissa >= 10f64.powi(step) {
        mantissa /= 10f64.powi(step);
        exponent += step;
    }

    let sign = if exponent < 0 {
        "-"
    } else if plus {
        "+"
    } else {
        ""
    };
    format!(
        "{}E{}{:0width$}",
        fixed(mantissa, mantissa_tokens),
        sign,
        exponent.unsigned_abs(),
        width = exp_width
    )
}

/// Fractions with a fixed or best-fit denominator
fn fraction(value: f64, body: &[Token]) -> Option<String> {
    let slash = body.iter().position(|t| matches!(t, Token::Slash))?;
    let before = &body[..slash];
    let after = &body[slash + 1..];

    let numerator_start = before
        .iter()
        .rposition(|t| !matches!(t, Token::Digit(_)))
        .map_or(0, |i| i + 1);
    let has_whole = before[..numerator_start]
        .iter()
        .any(|t| matches!(t, Token::Digit(_)));

    let (whole, frac) = if has_whole {
        (value.trunc(), value.fract())
    } else {
        (0.0, value)
    };

    let (mut numerator, denominator) = match after.iter().find_map(|t| match t {
        Token::Denominator(d) => Some(*d),
        _ => None,
    }) {
        Some(d) => ((frac * d as f64).round() as u64, d as u64),
        None => {
            let places = digit_count(after).clamp(1, 6) as u32;
            best_fraction(frac, 10u64.pow(places) - 1)
        }
    };

    let mut whole = whole as u64;
    if has_whole && numerator >= denominator && denominator > 0 {
        whole += numerator / denominator;
        numerator %= denominator;
    }

    Some(if has_whole && numerator == 0 {
        whole.to_string()
    } else if has_whole && whole > 0 {
        format!("{} {}/{}", whole, numerator, denominator)
    } else {
        format!("{}/{}", numerator, denominator)
    })
}

/// Closest fraction with a denominator no larger than `max_denominator`
fn best_fraction(value: f64, max_denominator: u64) -> (u64, u64) {
    let mut best = (value.round() as u64, 1u64);
    let mut best_error = (value - best.0 as f64).abs();

    for denominator in 2..=max_denominator {
        if best_error == 0.0 {
            break;
        }
        let numerator = (value * denominator as f64).round();
        let error = (value - numerator / denominator as f64).abs();
        if error < best_error {
            best = (numerator as u64, denominator);
            best_error = error;
        }
    }
    best
}
