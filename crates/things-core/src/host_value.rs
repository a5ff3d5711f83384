//! Reader for osascript's source-form output (`osascript -s s`).
//!
//! Lists become arrays, records become objects, and `missing value` is kept
//! as the sentinel string so the decoder sees exactly what the host said.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::dates::MISSING_VALUE;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unreadable host output at offset {offset}: {message}")]
pub struct HostValueError {
    pub offset: usize,
    pub message: String,
}

/// Parses a complete osascript result. Blank output is `Value::Null`.
pub fn parse(text: &str) -> Result<Value, HostValueError> {
    let mut reader = Reader::new(text);
    reader.skip_ws();
    if reader.at_end() {
        return Ok(Value::Null);
    }
    let value = reader.value()?;
    reader.skip_ws();
    if !reader.at_end() {
        return Err(reader.error("trailing characters"));
    }
    Ok(value)
}

/// The text of a string result. Non-string results fall back to the raw
/// output so a listing script's text is never lost.
pub fn parse_text(text: &str) -> Result<String, HostValueError> {
    match parse(text)? {
        Value::Null => Ok(String::new()),
        Value::String(value) => Ok(value),
        _ => Ok(text.trim().to_string()),
    }
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
}

impl Reader {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), HostValueError> {
        match self.bump() {
            Some(ch) if ch == wanted => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", wanted))),
        }
    }

    fn error(&self, message: &str) -> HostValueError {
        HostValueError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn value(&mut self) -> Result<Value, HostValueError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.collection(),
            Some('"') => self.string().map(Value::String),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.number(),
            Some(ch) if ch.is_alphabetic() || ch == '|' => self.word(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of output")),
        }
    }

    fn collection(&mut self) -> Result<Value, HostValueError> {
        self.expect('{')?;
        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Value::Array(Vec::new()));
        }
        if self.label_ahead() {
            self.record()
        } else {
            self.list()
        }
    }

    fn list(&mut self) -> Result<Value, HostValueError> {
        let mut items = Vec::new();
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Array(items)),
                _ => return Err(self.error("expected ',' or '}' in list")),
            }
        }
    }

    fn record(&mut self) -> Result<Value, HostValueError> {
        let mut map = Map::new();
        loop {
            self.skip_ws();
            let label = self.label()?;
            self.expect(':')?;
            let value = self.value()?;
            map.insert(label, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                _ => return Err(self.error("expected ',' or '}' in record")),
            }
        }
    }

    /// True when the upcoming token is `label:` rather than a list item.
    fn label_ahead(&self) -> bool {
        let mut idx = self.pos;
        if self.chars.get(idx) == Some(&'|') {
            return true;
        }
        match self.chars.get(idx) {
            Some(ch) if ch.is_alphabetic() || *ch == '_' => {}
            _ => return false,
        }
        while let Some(ch) = self.chars.get(idx) {
            if ch.is_alphanumeric() || *ch == '_' || *ch == ' ' {
                idx += 1;
                continue;
            }
            return *ch == ':';
        }
        false
    }

    fn label(&mut self) -> Result<String, HostValueError> {
        if self.peek() == Some('|') {
            self.pos += 1;
            let mut label = String::new();
            loop {
                match self.bump() {
                    Some('|') => return Ok(label),
                    Some(ch) => label.push(ch),
                    None => return Err(self.error("unterminated |label|")),
                }
            }
        }
        let mut label = String::new();
        while let Some(ch) = self.peek() {
            if ch == ':' {
                break;
            }
            label.push(ch);
            self.pos += 1;
        }
        let label = label.trim().to_string();
        if label.is_empty() {
            return Err(self.error("empty record label"));
        }
        Ok(label)
    }

    fn string(&mut self) -> Result<String, HostValueError> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(other) => out.push(other),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Value, HostValueError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(ch) if is_number_char(ch)) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error("invalid number"))
    }

    /// Bare words: `missing value`, booleans, enumerations, `date "..."`.
    fn word(&mut self) -> Result<Value, HostValueError> {
        if self.peek() == Some('|') {
            return self.label().map(Value::String);
        }
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '_' || ch == ' ') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let word = word.trim_end();
        // Put trailing spaces back for the caller's separator check.
        self.pos = start + word.chars().count();
        match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            MISSING_VALUE => Ok(Value::String(MISSING_VALUE.to_string())),
            "date" => {
                self.skip_ws();
                self.string().map(Value::String)
            }
            other => Ok(Value::String(other.to_string())),
        }
    }
}

fn is_number_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | 'E' | 'e' | '+')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_output_is_null() {
        assert_eq!(parse(""), Ok(Value::Null));
        assert_eq!(parse(" \n"), Ok(Value::Null));
    }

    #[test]
    fn reads_strings_with_escapes() {
        assert_eq!(
            parse(r#""say \"hi\"\nA1\tMilk""#),
            Ok(json!("say \"hi\"\nA1\tMilk"))
        );
        assert_eq!(parse_text("\"\"\n"), Ok(String::new()));
    }

    #[test]
    fn reads_lists_of_records() {
        let text = r#"{{id:"T1", name:"Ship", dueDate:missing value, status:"open", count:3}, {id:"T2", |tag names|:"a, b"}}"#;
        assert_eq!(
            parse(text),
            Ok(json!([
                {"id": "T1", "name": "Ship", "dueDate": "missing value", "status": "open", "count": 3},
                {"id": "T2", "tag names": "a, b"}
            ]))
        );
    }

    #[test]
    fn reads_plain_lists_and_words() {
        assert_eq!(
            parse(r#"{"a", 2, -1.5, true, missing value, completed}"#),
            Ok(json!(["a", 2, -1.5, true, "missing value", "completed"]))
        );
        assert_eq!(parse("{}"), Ok(json!([])));
        assert_eq!(
            parse(r#"date "Wednesday 6 August 2025 at 20:45:46""#),
            Ok(json!("Wednesday 6 August 2025 at 20:45:46"))
        );
    }

    #[test]
    fn rejects_truncated_output() {
        assert!(parse(r#"{id:"T1""#).is_err());
        assert!(parse(r#""open"#).is_err());
        assert!(parse(r#""a" "b""#).is_err());
    }

    #[test]
    fn parse_text_keeps_non_string_output() {
        assert_eq!(parse_text("42"), Ok("42".to_string()));
    }
}
