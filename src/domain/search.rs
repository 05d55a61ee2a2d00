use crate::{errors::AppError, schema::course::SearchQuery};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceSort {
    Newest,
    LowToHigh,
    HighToLow,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SearchFilter {
    pub query: String,
    pub categories: Vec<String>,
    pub sort: PriceSort,
}

impl TryFrom<SearchQuery> for SearchFilter {
    type Error = AppError;

    fn try_from(params: SearchQuery) -> Result<Self, Self::Error> {
        let query = params.query.unwrap_or_default().trim().to_string();

        let mut categories: Vec<String> = params
            .categories
            .unwrap_or_default()
            .split(',')
            .map(|category| category.trim().to_lowercase())
            .filter(|category| !category.is_empty())
            .collect();
        categories.sort();
        categories.dedup();

        let sort = match params.sort_by_price.as_deref().map(str::trim) {
            None | Some("") => PriceSort::Newest,
            Some("low") => PriceSort::LowToHigh,
            Some("high") => PriceSort::HighToLow,
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "sortByPrice must be 'low' or 'high', got '{other}'"
                )))
            }
        };

        Ok(Self { query, categories, sort })
    }
}

impl SearchFilter {
    /// ILIKE pattern for the free-text query with `%`, `_` and `\` taken literally.
    pub fn like_pattern(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let mut escaped = String::with_capacity(self.query.len() + 2);
        for ch in self.query.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        Some(format!("%{escaped}%"))
    }
}
