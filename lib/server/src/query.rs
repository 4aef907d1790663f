use crate::ApiError;
use std::collections::HashMap;
use std::str::FromStr;

/// Decoded query string parameters. The first occurrence of a name wins.
#[derive(Debug, Default)]
pub(crate) struct Query {
    params: HashMap<String, String>,
}

impl Query {
    pub(crate) fn parse(query: &str) -> Self {
        let mut params = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(name.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { params }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn required(&self, name: &'static str) -> Result<&str, ApiError> {
        self.get(name).ok_or(ApiError::MissingParameter(name))
    }

    pub(crate) fn parsed_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ApiError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ApiError::InvalidParameter(name)),
        }
    }

    pub(crate) fn parsed<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ApiError> {
        self.get(name)
            .map(|value| value.parse().map_err(|_| ApiError::InvalidParameter(name)))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_values() {
        let query = Query::parse("token=a%20b&path=%2Fx%2By&path=ignored&offset=12");
        assert_eq!(query.get("token"), Some("a b"));
        assert_eq!(query.get("path"), Some("/x+y"), "first occurrence wins");
        assert_eq!(query.parsed_or("offset", 0u64), Ok(12));
        assert_eq!(query.parsed_or("size", 7u64), Ok(7));
        assert_eq!(query.parsed::<u64>("size"), Ok(None));
        assert_eq!(
            query.required("data"),
            Err(ApiError::MissingParameter("data"))
        );
        assert_eq!(
            query.parsed_or::<u64>("token", 0),
            Err(ApiError::InvalidParameter("token"))
        );
    }
}
