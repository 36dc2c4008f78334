//! Declarative status text
//!
//! A [`Ui`] describes what a task shows in its status line after a
//! transition. It is either a literal string, a [`Template`] whose text and
//! subtext are each literal or computed from the context, or a function of
//! the context producing one of those. Descriptions are resolved fresh on
//! every render into a [`Rendered`] value; they are never mutated.

use std::fmt;
use std::sync::Arc;

/// Indentation placed in front of the subtext line
pub const SUBTEXT_INDENT: &str = "  ";

pub type TextFn<C> = Arc<dyn Fn(&C) -> String + Send + Sync>;
pub type UiFn<C> = Arc<dyn Fn(&C) -> Ui<C> + Send + Sync>;

/// A single piece of display text, fixed or derived from the context
pub enum Text<C> {
    Literal(String),
    Computed(TextFn<C>),
}

impl<C> Text<C> {
    pub fn computed(f: impl Fn(&C) -> String + Send + Sync + 'static) -> Self {
        Text::Computed(Arc::new(f))
    }

    pub fn resolve(&self, ctx: &C) -> String {
        match self {
            Text::Literal(text) => text.clone(),
            Text::Computed(f) => f(ctx),
        }
    }
}

impl<C> Clone for Text<C> {
    fn clone(&self) -> Self {
        match self {
            Text::Literal(text) => Text::Literal(text.clone()),
            Text::Computed(f) => Text::Computed(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for Text<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Text::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Text::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<C> From<&str> for Text<C> {
    fn from(text: &str) -> Self {
        Text::Literal(text.to_string())
    }
}

impl<C> From<String> for Text<C> {
    fn from(text: String) -> Self {
        Text::Literal(text)
    }
}

/// Text plus an optional subtext, resolved independently
pub struct Template<C> {
    pub text: Option<Text<C>>,
    pub subtext: Option<Text<C>>,
}

impl<C> Template<C> {
    pub fn new() -> Self {
        Self {
            text: None,
            subtext: None,
        }
    }

    pub fn text(mut self, text: impl Into<Text<C>>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn subtext(mut self, subtext: impl Into<Text<C>>) -> Self {
        self.subtext = Some(subtext.into());
        self
    }
}

impl<C> Default for Template<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Template<C> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            subtext: self.subtext.clone(),
        }
    }
}

impl<C> fmt::Debug for Template<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("text", &self.text)
            .field("subtext", &self.subtext)
            .finish()
    }
}

/// What a task should display after a transition
pub enum Ui<C> {
    Literal(String),
    Template(Template<C>),
    Computed(UiFn<C>),
}

impl<C> Ui<C> {
    /// Text with an indented subtext line below it
    pub fn with_subtext(text: impl Into<Text<C>>, subtext: impl Into<Text<C>>) -> Self {
        Ui::Template(Template::new().text(text).subtext(subtext))
    }

    /// Replace only the subtext, keeping whatever text is already displayed
    pub fn subtext(subtext: impl Into<Text<C>>) -> Self {
        Ui::Template(Template::new().subtext(subtext))
    }

    pub fn computed(f: impl Fn(&C) -> Ui<C> + Send + Sync + 'static) -> Self {
        Ui::Computed(Arc::new(f))
    }

    pub fn render(&self, ctx: &C) -> Rendered {
        match self {
            Ui::Literal(text) => Rendered {
                text: Some(text.clone()),
                subtext: None,
            },
            Ui::Template(template) => Rendered {
                text: template.text.as_ref().map(|text| text.resolve(ctx)),
                subtext: template.subtext.as_ref().map(|subtext| subtext.resolve(ctx)),
            },
            Ui::Computed(f) => f(ctx).render(ctx),
        }
    }
}

impl<C> Clone for Ui<C> {
    fn clone(&self) -> Self {
        match self {
            Ui::Literal(text) => Ui::Literal(text.clone()),
            Ui::Template(template) => Ui::Template(template.clone()),
            Ui::Computed(f) => Ui::Computed(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for Ui<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ui::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Ui::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Ui::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<C> From<&str> for Ui<C> {
    fn from(text: &str) -> Self {
        Ui::Literal(text.to_string())
    }
}

impl<C> From<String> for Ui<C> {
    fn from(text: String) -> Self {
        Ui::Literal(text)
    }
}

impl<C> From<Template<C>> for Ui<C> {
    fn from(template: Template<C>) -> Self {
        Ui::Template(template)
    }
}

/// Resolved display text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: Option<String>,
    pub subtext: Option<String>,
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            subtext: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.subtext.is_none()
    }

    /// Apply a newer render on top of this one.
    ///
    /// A new `text` replaces both fields; a lone `subtext` keeps the current
    /// text and swaps only the subtext.
    pub fn merge(&mut self, next: Rendered) {
        if next.text.is_some() {
            *self = next;
        } else if next.subtext.is_some() {
            self.subtext = next.subtext;
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.as_deref().unwrap_or_default())?;
        if let Some(subtext) = &self.subtext {
            write!(f, "\n{}{}", SUBTEXT_INDENT, subtext)?;
        }
        Ok(())
    }
}

/// Resolve an optional description against the context.
///
/// An absent description renders to nothing.
pub fn render<C>(ctx: &C, ui: Option<&Ui<C>>) -> Rendered {
    ui.map(|ui| ui.render(ctx)).unwrap_or_default()
}
