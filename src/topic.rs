use regex::Regex;
use snafu::ensure;

use crate::errors::*;

lazy_static! {
    static ref FILTER_VALIDATOR: Regex = Regex::new(r"^(([^/\+#]*|\+)/)*([^/\+#]*|#|\+)?$").unwrap();
}

/// Checks the requirements for a MQTT string field.
/// 1. The string length is <= 65535 bytes.
/// 2. Does not contain the null character U+0000.
pub fn check_string(field: &'static str, s: &str) -> Result<(), ValidationError> {
    ensure!(s.len() <= u16::MAX as usize, FieldTooLong { field, len: s.len() });
    ensure!(!s.contains('\0'), NullCharacter { field });
    Ok(())
}

/// A topic name is what a PUBLISH is sent to: at least one character and no wildcards.
pub fn validate_topic_name(topic: &str) -> Result<(), ValidationError> {
    check_string("Topic name", topic)?;
    ensure!(
        !topic.is_empty() && !topic.contains(&['+', '#'][..]),
        InvalidTopicName { topic }
    );
    Ok(())
}

/// A topic filter may use `+` for a whole level and `#` as the whole last level.
pub fn validate_topic_filter(filter: &str) -> Result<(), ValidationError> {
    check_string("Topic filter", filter)?;
    ensure!(
        !filter.is_empty() && FILTER_VALIDATOR.is_match(filter),
        InvalidTopicFilter { filter }
    );
    Ok(())
}
