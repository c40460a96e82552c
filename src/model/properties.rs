//! Fence info-string parsing.
//!
//! Accepts both the plain form `python #main file=out.py` and the attribute
//! block form `{.python #main file="out file.py"}`.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while1},
    character::complete::{char, multispace0, multispace1, none_of},
    combinator::{all_consuming, map, opt, value},
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use super::reference_name::is_name_char;
use crate::errors::{EntangledError, Result};

/// One item of an info string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// `.python`, or a bare leading word.
    Class(String),
    /// `#main`
    Id(String),
    /// `file=out.py`
    Attribute(String, String),
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char).parse(input)
}

fn class(input: &str) -> IResult<&str, Property> {
    map(preceded(char('.'), ident), |s: &str| Property::Class(s.to_string())).parse(input)
}

fn id(input: &str) -> IResult<&str, Property> {
    map(preceded(char('#'), ident), |s: &str| Property::Id(s.to_string())).parse(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    let escapes = || {
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("'", tag("'")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        ))
    };
    alt((
        delimited(
            char('"'),
            map(
                opt(escaped_transform(none_of("\\\""), '\\', escapes())),
                Option::unwrap_or_default,
            ),
            char('"'),
        ),
        delimited(
            char('\''),
            map(
                opt(escaped_transform(none_of("\\'"), '\\', escapes())),
                Option::unwrap_or_default,
            ),
            char('\''),
        ),
    ))
    .parse(input)
}

fn bare_value(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| !c.is_whitespace() && c != '}'), str::to_string).parse(input)
}

fn attribute(input: &str) -> IResult<&str, Property> {
    map(
        (ident, char('='), alt((quoted, bare_value))),
        |(key, _, val)| Property::Attribute(key.to_string(), val),
    )
    .parse(input)
}

fn property(input: &str) -> IResult<&str, Property> {
    alt((class, id, attribute)).parse(input)
}

/// The first item may be a bare language word; the rest must be prefixed.
fn property_list(input: &str) -> IResult<&str, Vec<Property>> {
    let (input, _) = multispace0.parse(input)?;
    let first_word = map(ident, |s: &str| Property::Class(s.to_string()));
    let (input, first) = opt(alt((property, first_word))).parse(input)?;
    let Some(first) = first else {
        return Ok((input, Vec::new()));
    };
    let (input, rest) = many0(preceded(multispace1, property)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest);
    Ok((input, items))
}

fn info_string(input: &str) -> IResult<&str, Vec<Property>> {
    let braced = delimited(
        (multispace0, char('{')),
        property_list,
        (char('}'), multispace0),
    );
    alt((braced, property_list)).parse(input)
}

/// Parses an info string into its items.
pub fn parse_properties(input: &str) -> Result<Vec<Property>> {
    all_consuming(info_string)
        .parse(input)
        .map(|(_, items)| items)
        .map_err(|e| EntangledError::InvalidProperty(format!("`{}`: {}", input.trim(), e)))
}

/// A parsed info string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    items: Vec<Property>,
}

impl Properties {
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self {
            items: parse_properties(input)?,
        })
    }

    /// The language: the first class.
    pub fn language(&self) -> Option<&str> {
        self.items.iter().find_map(|p| match p {
            Property::Class(c) => Some(c.as_str()),
            _ => None,
        })
    }

    /// The fragment name: the first id.
    pub fn id(&self) -> Option<&str> {
        self.items.iter().find_map(|p| match p {
            Property::Id(i) => Some(i.as_str()),
            _ => None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// The declared output file.
    pub fn file(&self) -> Option<&str> {
        self.get("file")
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|p| match p {
            Property::Attribute(k, v) => Some((k.as_str(), v.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_form() {
        let props = parse_properties("python #main file=output.py").unwrap();
        assert_eq!(
            props,
            vec![
                Property::Class("python".to_string()),
                Property::Id("main".to_string()),
                Property::Attribute("file".to_string(), "output.py".to_string()),
            ]
        );
    }

    #[test]
    fn test_braced_form() {
        let props = Properties::parse("{.python #hello file=\"src/hello world.py\"}").unwrap();
        assert_eq!(props.language(), Some("python"));
        assert_eq!(props.id(), Some("hello"));
        assert_eq!(props.file(), Some("src/hello world.py"));
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let props = Properties::parse(" { .rust   #main } ").unwrap();
        assert_eq!(props.language(), Some("rust"));
        assert_eq!(props.id(), Some("main"));
    }

    #[test]
    fn test_quoted_values() {
        let props = Properties::parse("desc=\"hello \\\"world\\\"\" note='x' empty=\"\"").unwrap();
        assert_eq!(props.get("desc"), Some("hello \"world\""));
        assert_eq!(props.get("note"), Some("x"));
        assert_eq!(props.get("empty"), Some(""));
    }

    #[test]
    fn test_namespaced_id_and_paths() {
        let props = Properties::parse("c++ #module::function file=src/lib/out.cpp").unwrap();
        assert_eq!(props.language(), Some("c++"));
        assert_eq!(props.id(), Some("module::function"));
        assert_eq!(props.file(), Some("src/lib/out.cpp"));
    }

    #[test]
    fn test_plus_in_id() {
        let props = Properties::parse("python #a+b").unwrap();
        assert_eq!(props.id(), Some("a+b"));
    }

    #[test]
    fn test_empty() {
        assert!(Properties::parse("").unwrap().is_empty());
        assert!(Properties::parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_brace() {
        assert!(parse_properties("{.python #main").is_err());
    }

    #[test]
    fn test_second_bare_word_rejected() {
        assert!(parse_properties("python main").is_err());
    }
}
