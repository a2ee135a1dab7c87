//! Named, colored labels attached to todos

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use csscolorparser::Color;
use serde::{Deserialize, Serialize};

use crate::todo::Todo;

pub type TagId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    color: Color,
}

impl Tag {
    pub fn new<S: ToString>(id: TagId, name: S, color: Color) -> Self {
        Self { id, name: name.to_string(), color }
    }

    pub fn id(&self) -> TagId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn color(&self) -> &Color { &self.color }
}

/// The body of a tag creation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagDraft {
    pub name: String,
    pub color: Color,
}

impl TagDraft {
    /// Build a draft from a name and any CSS color (`#1e90ff`, `rebeccapurple`, `rgb(0, 128, 0)`...)
    pub fn new<S: ToString>(name: S, color: &str) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            name: name.to_string().trim().to_string(),
            color: csscolorparser::parse(color)?,
        })
    }
}


/// Restricts the todos that are displayed to those having a given tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFilter {
    All,
    Tag(TagId),
}

impl Default for TagFilter {
    fn default() -> Self {
        TagFilter::All
    }
}

impl TagFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Tag(id) => todo.has_tag(*id),
        }
    }

    pub fn apply(&self, todos: Vec<Todo>) -> Vec<Todo> {
        match self {
            TagFilter::All => todos,
            TagFilter::Tag(_) => todos.into_iter().filter(|todo| self.matches(todo)).collect(),
        }
    }
}

impl Display for TagFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagFilter::All => write!(f, "all"),
            TagFilter::Tag(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for TagFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(TagFilter::All);
        }
        s.parse::<TagId>()
            .map(TagFilter::Tag)
            .map_err(|_| format!("invalid tag filter {:?} (expected \"all\" or a tag id)", s))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::TodoDraft;

    #[test]
    fn tag_filter() {
        let red = Tag::new(1, "urgent", csscolorparser::parse("red").unwrap());
        let mut tagged = Todo::from_draft(1, &TodoDraft::new("a"));
        tagged.set_tags(vec![red]);
        let untagged = Todo::from_draft(2, &TodoDraft::new("b"));

        let todos = vec![tagged.clone(), untagged.clone()];
        assert_eq!(TagFilter::All.apply(todos.clone()).len(), 2);
        assert_eq!(TagFilter::Tag(1).apply(todos.clone()), vec![tagged]);
        assert!(TagFilter::Tag(2).apply(todos).is_empty());

        assert_eq!("all".parse::<TagFilter>().unwrap(), TagFilter::All);
        assert_eq!("12".parse::<TagFilter>().unwrap(), TagFilter::Tag(12));
        assert!("work".parse::<TagFilter>().is_err());
    }

    #[test]
    fn tag_drafts_accept_css_colors() {
        let draft = TagDraft::new("  home ", "rebeccapurple").unwrap();
        assert_eq!(draft.name, "home");
        assert_eq!(draft.color.to_hex_string(), "#663399");
        assert!(TagDraft::new("home", "not-a-color").is_err());
    }
}
