use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The closed set of topics the listing API serves as categories. Anything
/// else a user types in is a custom topic and goes through free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Technology,
    Business,
    Science,
    Health,
    Entertainment,
    Sports,
    Politics,
    Environment,
    Finance,
    General,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Technology,
        Category::Business,
        Category::Science,
        Category::Health,
        Category::Entertainment,
        Category::Sports,
        Category::Politics,
        Category::Environment,
        Category::Finance,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Science => "science",
            Category::Health => "health",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Politics => "politics",
            Category::Environment => "environment",
            Category::Finance => "finance",
            Category::General => "general",
        }
    }

    pub fn info(self) -> CategoryInfo {
        let (name, description) = match self {
            Category::Technology => ("Technology", "Latest tech news, gadgets, and digital innovations"),
            Category::Business => ("Business", "Market trends, companies, and economic updates"),
            Category::Science => ("Science", "Scientific discoveries, research, and breakthroughs"),
            Category::Health => ("Health", "Medical advances, wellness, and healthcare policy"),
            Category::Entertainment => ("Entertainment", "Movies, music, celebrities, and pop culture"),
            Category::Sports => ("Sports", "Games, athletes, leagues, and sporting events"),
            Category::Politics => ("Politics", "Elections, policies, government, and international relations"),
            Category::Environment => ("Environment", "Climate change, conservation, and sustainability"),
            Category::Finance => ("Finance", "Personal finance, investing, and economic policy"),
            Category::General => ("General", "Top headlines and breaking news"),
        };
        CategoryInfo { id: self.as_str(), name, description }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_exact_identifiers() {
        assert_eq!("science".parse::<Category>(), Ok(Category::Science));
        assert!("Science".parse::<Category>().is_err());
        assert!("space".parse::<Category>().is_err());
    }
}
