//! Article input validation

use super::ValidationError;

const MAX_ARTICLE_NAME_LEN: usize = 256;

/// An article ready to insert
#[derive(Debug, Clone)]
pub struct NewArticle {
    name: String,
}

impl NewArticle {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "article name" });
        }

        if trimmed.chars().count() > MAX_ARTICLE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "article name",
                max: MAX_ARTICLE_NAME_LEN,
            });
        }

        Ok(Self {
            name: trimmed.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_names() {
        assert!(NewArticle::new("").is_err());
        assert_eq!(NewArticle::new(" 11 ").unwrap().name(), "11");
    }
}
