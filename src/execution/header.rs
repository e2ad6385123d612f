/// One `Name: value` line of the CGI header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    name: String,
    value: String,
}

impl ResponseHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Case-insensitive name comparison; php-cgi writes `Content-type`.
    pub fn is(&self, name: &str) -> bool {
        self.name
            .eq_ignore_ascii_case(name)
    }

    /// `None` for lines without a colon or with an empty or non-token name.
    pub(crate) fn parse(line: &[u8]) -> Option<Self> {
        let colon = memchr::memchr(b':', line)?;
        let (name, rest) = (&line[..colon], &line[colon + 1..]);

        if name.is_empty() || !name.iter().all(is_token_byte) {
            return None;
        }

        let value = String::from_utf8_lossy(rest);

        Some(Self {
            // all token bytes are ASCII
            name: String::from_utf8_lossy(name).into_owned(),
            value: value
                .trim_matches(|c| c == ' ' || c == '\t')
                .to_string(),
        })
    }
}

fn is_token_byte(b: &u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(b)
}
