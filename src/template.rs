use pest::Parser;
use pest_derive::Parser;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "template.pest"]
struct TemplateParser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid template '{template}': {message}")]
    Syntax { template: String, message: String },

    #[error("unknown placeholder {{{0}}}, expected one of {{owner}}, {{repository}}, {{username}}, {{project}}")]
    UnknownPlaceholder(String),

    #[error("placeholder {placeholder} cannot be used here")]
    NotAllowed { placeholder: Placeholder },

    #[error("placeholder {0} has no value here")]
    Unavailable(Placeholder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Owner,
    Repository,
    Username,
    Project,
}

impl Placeholder {
    fn name(self) -> &'static str {
        match self {
            Placeholder::Owner => "owner",
            Placeholder::Repository => "repository",
            Placeholder::Username => "username",
            Placeholder::Project => "project",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

impl FromStr for Placeholder {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Placeholder::Owner),
            "repository" => Ok(Placeholder::Repository),
            "username" => Ok(Placeholder::Username),
            "project" => Ok(Placeholder::Project),
            other => Err(TemplateError::UnknownPlaceholder(other.to_string())),
        }
    }
}

/// Values available when rendering a template
#[derive(Debug, Default, Clone, Copy)]
pub struct Vars<'a> {
    pub owner: Option<&'a str>,
    pub repository: Option<&'a str>,
    pub username: Option<&'a str>,
    pub project: Option<&'a str>,
}

impl<'a> Vars<'a> {
    fn get(&self, placeholder: Placeholder) -> Option<&'a str> {
        match placeholder {
            Placeholder::Owner => self.owner,
            Placeholder::Repository => self.repository,
            Placeholder::Username => self.username,
            Placeholder::Project => self.project,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A project or column name with `{placeholder}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut pairs = TemplateParser::parse(Rule::template, source).map_err(|e| {
            TemplateError::Syntax {
                template: source.to_string(),
                message: e.variant.message().to_string(),
            }
        })?;

        let mut segments = Vec::new();

        if let Some(template) = pairs.next() {
            for pair in template.into_inner() {
                match pair.as_rule() {
                    Rule::literal => segments.push(Segment::Literal(pair.as_str().to_string())),
                    Rule::placeholder => {
                        let name = pair.into_inner().next().map(|n| n.as_str()).unwrap_or_default();
                        segments.push(Segment::Placeholder(name.parse()?));
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template references `placeholder`
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.placeholders().any(|p| p == placeholder)
    }

    /// Fails on the first placeholder not listed in `allowed`
    pub fn allow_only(&self, allowed: &[Placeholder]) -> Result<(), TemplateError> {
        match self.placeholders().find(|p| !allowed.contains(p)) {
            Some(placeholder) => Err(TemplateError::NotAllowed { placeholder }),
            None => Ok(()),
        }
    }

    pub fn render(&self, vars: &Vars<'_>) -> Result<String, TemplateError> {
        let mut rendered = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = vars
                        .get(*placeholder)
                        .ok_or(TemplateError::Unavailable(*placeholder))?;
                    rendered.push_str(value);
                }
            }
        }

        Ok(rendered)
    }

    fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
