//! Outcome Parsing
//!
//! Converts free-form outcome text ("+500", "lost two hundred", "3k") into a
//! signed integer profit/loss amount in the user's currency units.
//!
//! Parsing runs in priority order: unit-word substitution, then a
//! word-to-number pass over the resulting tokens, then a plain integer-token
//! fallback. Sign comes from an explicit `+`/`-` on the literal when present,
//! otherwise from a fixed list of loss cue words in the original text.

/// Unit words rewritten as zero-padding before any numeric interpretation.
///
/// Substitution is a naive substring replace, applied anywhere in the text,
/// including inside unrelated words ("make" becomes "ma000e"). Mixed tokens
/// produced that way are ignored by the token passes below, but the behavior
/// itself is load-bearing: "two hundred" must become "two 00" so the
/// word-to-number pass can treat the zero run as a magnitude suffix.
const UNIT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("hundred", "00"),
    ("thousand", "000"),
    ("k", "000"),
    ("m", "000000"),
];

/// Words that flip an unsigned magnitude negative ("lost two hundred").
///
/// An explicit `-` on a digit literal always wins over these.
const NEGATIVE_CUES: &[&str] = &["lost", "loss", "lose", "losing", "down", "minus", "dropped"];

const WORD_VALUES: &[(&str, i64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Parse free-form outcome text into a signed amount.
///
/// Returns `None` when no numeric content can be recovered.
pub fn parse_outcome(text: &str) -> Option<i64> {
    let original = text.to_lowercase();
    let normalized = normalize(&original);

    if let Some(parsed) = words_to_number(&normalized) {
        return Some(apply_sign(parsed, &original));
    }

    first_integer_token(&normalized)
}

/// Lowercase and apply the unit-word substitutions in declared order.
fn normalize(lowered: &str) -> String {
    let mut out = lowered.to_string();
    for (word, padding) in UNIT_SUBSTITUTIONS {
        out = out.replace(word, padding);
    }
    out
}

/// Magnitude plus the sign of the first explicitly signed literal, if any.
struct ParsedNumber {
    magnitude: i64,
    explicit_sign: Option<i64>,
}

/// Word-to-number pass over whitespace tokens.
///
/// Number words accumulate additively ("twenty five" is 25). An all-zero
/// digit run following earlier numeric content acts as a magnitude suffix,
/// which is how substituted unit words compose: "two 00" is 200,
/// "twenty 00" is 2000. Plain digit tokens contribute their value directly.
/// Tokens that are neither are filler and skipped.
fn words_to_number(normalized: &str) -> Option<ParsedNumber> {
    let mut magnitude: i64 = 0;
    let mut explicit_sign: Option<i64> = None;
    let mut found = false;

    for raw in normalized.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '+' && c != '-');
        if token.is_empty() {
            continue;
        }

        if let Some(value) = word_value(token) {
            magnitude = magnitude.checked_add(value)?;
            found = true;
            continue;
        }

        let (sign, digits) = split_sign(token);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        if sign.is_none() && found && digits.bytes().all(|b| b == b'0') {
            let scale = 10_i64.checked_pow(u32::try_from(digits.len()).ok()?)?;
            magnitude = magnitude.checked_mul(scale)?;
        } else {
            magnitude = magnitude.checked_add(digits.parse::<i64>().ok()?)?;
            found = true;
            if explicit_sign.is_none() {
                explicit_sign = sign;
            }
        }
    }

    found.then_some(ParsedNumber {
        magnitude,
        explicit_sign,
    })
}

/// Fallback: the first whitespace token that is a signed or unsigned
/// integer literal, taken with its own sign.
fn first_integer_token(normalized: &str) -> Option<i64> {
    normalized
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '+' && c != '-'))
        .find_map(|token| {
            let (sign, digits) = split_sign(token);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<i64>().ok().map(|v| v * sign.unwrap_or(1))
        })
}

fn split_sign(token: &str) -> (Option<i64>, &str) {
    if let Some(rest) = token.strip_prefix('-') {
        (Some(-1), rest)
    } else if let Some(rest) = token.strip_prefix('+') {
        (Some(1), rest)
    } else {
        (None, token)
    }
}

fn word_value(token: &str) -> Option<i64> {
    WORD_VALUES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, value)| *value)
}

/// Resolve the final sign: an explicit literal sign wins, then loss cues
/// in the original text, then positive.
fn apply_sign(parsed: ParsedNumber, original: &str) -> i64 {
    match parsed.explicit_sign {
        Some(sign) => sign * parsed.magnitude,
        None if has_negative_cue(original) => -parsed.magnitude,
        None => parsed.magnitude,
    }
}

fn has_negative_cue(original: &str) -> bool {
    original
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .any(|token| NEGATIVE_CUES.contains(&token))
}
