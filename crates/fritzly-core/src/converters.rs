// Built-in value converters.
//
// The router reports everything as strings. These turn the common shapes
// into JSON values a `Queryable` member can be deserialized from; register
// them with `Scope::converter` under whatever name the fields reference.

use serde_json::{Number, Value};

pub fn string(raw: &str) -> Result<Value, String> {
    Ok(Value::String(raw.to_owned()))
}

pub fn int(raw: &str) -> Result<Value, String> {
    raw.trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|e| format!("'{raw}' is not an integer: {e}"))
}

pub fn uint(raw: &str) -> Result<Value, String> {
    raw.trim()
        .parse::<u64>()
        .map(Value::from)
        .map_err(|e| format!("'{raw}' is not an unsigned integer: {e}"))
}

pub fn float(raw: &str) -> Result<Value, String> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| format!("'{raw}' is not a finite number"))
}

/// `1`/`true` and `0`/`false`, as the router writes switches.
pub fn bool(raw: &str) -> Result<Value, String> {
    match raw.trim() {
        "1" | "true" => Ok(Value::Bool(true)),
        "0" | "false" => Ok(Value::Bool(false)),
        other => Err(format!("'{other}' is not a boolean")),
    }
}

/// Line rates are reported in kbit/s.
pub fn kbit_to_bps(raw: &str) -> Result<Value, String> {
    let kbit = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("'{raw}' is not a rate: {e}"))?;
    kbit.checked_mul(1000)
        .map(Value::from)
        .ok_or_else(|| format!("rate '{raw}' overflows"))
}

/// Plain seconds, or `[<days>d ]hh:mm:ss`.
pub fn duration_secs(raw: &str) -> Result<Value, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Value::from(secs));
    }

    let invalid = || format!("'{raw}' is not a duration");
    let (days, clock) = match raw.split_once('d') {
        Some((days, clock)) => (days.trim().parse::<u64>().map_err(|_| invalid())?, clock.trim()),
        None => (0, raw),
    };

    let fields: Vec<&str> = clock.split(':').collect();
    let &[hours, minutes, seconds] = fields.as_slice() else {
        return Err(invalid());
    };
    let number = |s: &str| s.parse::<u64>().map_err(|_| invalid());

    let secs = days
        .saturating_mul(86_400)
        .saturating_add(number(hours)?.saturating_mul(3600))
        .saturating_add(number(minutes)?.saturating_mul(60))
        .saturating_add(number(seconds)?);
    Ok(Value::from(secs))
}

/// Empty means "not set".
pub fn optional(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::String(trimmed.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers() {
        assert_eq!(int(" -12 ").unwrap(), json!(-12));
        assert_eq!(uint("7").unwrap(), json!(7));
        assert!(uint("-1").is_err());
        assert_eq!(float("0.5").unwrap(), json!(0.5));
        assert!(float("NaN").is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(bool("1").unwrap(), json!(true));
        assert_eq!(bool("false").unwrap(), json!(false));
        assert!(bool("yes").is_err());
    }

    #[test]
    fn rates() {
        assert_eq!(kbit_to_bps("116789").unwrap(), json!(116_789_000));
        assert!(kbit_to_bps("").is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(duration_secs("3600").unwrap(), json!(3600));
        assert_eq!(duration_secs("01:02:03").unwrap(), json!(3723));
        assert_eq!(duration_secs("2d 00:00:10").unwrap(), json!(172_810));
        assert!(duration_secs("1:2").is_err());
        assert!(duration_secs("soon").is_err());
    }

    #[test]
    fn optional_values() {
        assert_eq!(optional("").unwrap(), Value::Null);
        assert_eq!(optional(" 192.0.2.1 ").unwrap(), json!("192.0.2.1"));
        assert_eq!(string(" x ").unwrap(), json!(" x "));
    }
}
