//! Permalink patterns for published posts.
//!
//! A pattern such as `/log/:year/:month/:day/:title` is parsed once into
//! literal text and placeholders, then rendered per post.

use super::ContentError;
use chrono::{Datelike, NaiveDate};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    Month,
    Day,
    Title,
}

/// A parsed permalink pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permalink {
    segments: Vec<Segment>,
}

impl FromStr for Permalink {
    type Err = ContentError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        if !pattern.starts_with('/') {
            return Err(ContentError::Permalink(format!(
                "`{pattern}` must start with `/`"
            )));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(pos) = rest.find(':') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after.len());
            let name = &after[..name_len];

            let segment = match name {
                "year" => Segment::Year,
                "month" => Segment::Month,
                "day" => Segment::Day,
                "title" => Segment::Title,
                "" => {
                    // A lone colon is literal text
                    literal.push(':');
                    rest = after;
                    continue;
                }
                other => {
                    return Err(ContentError::Permalink(format!(
                        "unsupported placeholder `:{other}`"
                    )));
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[name_len..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.contains(&Segment::Title) {
            return Err(ContentError::Permalink(format!(
                "`{pattern}` must contain `:title`"
            )));
        }

        Ok(Self { segments })
    }
}

impl Permalink {
    /// Render the route of a post published on `date` with filename slug `title`.
    pub fn render(&self, date: NaiveDate, title: &str) -> String {
        let mut route = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => route.push_str(text),
                Segment::Year => route.push_str(&format!("{:04}", date.year())),
                Segment::Month => route.push_str(&format!("{:02}", date.month())),
                Segment::Day => route.push_str(&format!("{:02}", date.day())),
                Segment::Title => route.push_str(title),
            }
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_pattern() {
        let permalink: Permalink = "/log/:year/:month/:day/:title".parse().unwrap();
        assert_eq!(
            permalink.render(date(2015, 4, 28), "Play-Typed-Action"),
            "/log/2015/04/28/Play-Typed-Action"
        );
    }

    #[test]
    fn test_placeholder_inside_segment() {
        let permalink: Permalink = "/:year-:month/:title.html".parse().unwrap();
        assert_eq!(permalink.render(date(2016, 1, 3), "futures"), "/2016-01/futures.html");
    }

    #[test]
    fn test_lone_colon_is_literal() {
        let permalink: Permalink = "/a:/:title".parse().unwrap();
        assert_eq!(permalink.render(date(2016, 1, 3), "x"), "/a:/x");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = "/:categories/:title".parse::<Permalink>().unwrap_err();
        assert!(err.to_string().contains(":categories"));
    }

    #[test]
    fn test_requires_title_and_leading_slash() {
        assert!("/:year/:month".parse::<Permalink>().is_err());
        assert!("log/:title".parse::<Permalink>().is_err());
    }
}
