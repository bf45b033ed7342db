//! Document style access for the scroll lock

use arcatalog_core::{PageError, PageStyle, PageSurface};
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, HtmlElement};

const PROPERTIES: [&str; 4] = ["overflow", "width", "height", "margin"];

/// Inline style of one element
pub trait StyleTarget {
    fn read_style(&self) -> PageStyle;
    fn write_style(&mut self, style: &PageStyle) -> Result<(), PageError>;
}

/// Inline styles of `<html>` and `<body>`
///
/// `read` reports the body style, which is what the scroll lock captures.
/// The `<html>` style is captured here on lock and put back on unlock, since
/// iOS Safari keeps scrolling unless both elements are locked. The scroll
/// lock writes the immersive style once when engaging and the captured style
/// (possibly retried) when releasing, so the first write after an unlock is
/// always the lock.
pub struct DocumentPage<T: StyleTarget> {
    body: T,
    root: T,
    engaged: bool,
    saved_root: Option<PageStyle>,
}

impl<T: StyleTarget> DocumentPage<T> {
    pub fn with_targets(body: T, root: T) -> Self {
        Self {
            body,
            root,
            engaged: false,
            saved_root: None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

impl<T: StyleTarget> PageSurface for DocumentPage<T> {
    fn read(&self) -> PageStyle {
        self.body.read_style()
    }

    fn write(&mut self, style: &PageStyle) -> Result<(), PageError> {
        if !self.engaged {
            // Held from here on, so a failed lock is still undone by the release
            self.engaged = true;
            self.saved_root = Some(self.root.read_style());
            self.root.write_style(style)?;
            return self.body.write_style(style);
        }

        self.body.write_style(style)?;
        if let Some(saved) = &self.saved_root {
            self.root.write_style(saved)?;
        }
        self.saved_root = None;
        self.engaged = false;
        Ok(())
    }
}

/// The document element an [`InlineStyle`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Body,
    Root,
}

impl InlineStyle {
    fn declaration(&self) -> Option<CssStyleDeclaration> {
        let document = web_sys::window()?.document()?;
        match self {
            InlineStyle::Body => Some(document.body()?.style()),
            InlineStyle::Root => {
                let root: HtmlElement = document.document_element()?.dyn_into().ok()?;
                Some(root.style())
            }
        }
    }
}

impl StyleTarget for InlineStyle {
    fn read_style(&self) -> PageStyle {
        let Some(style) = self.declaration() else {
            return PageStyle::default();
        };

        let get = |name: &str| {
            style
                .get_property_value(name)
                .ok()
                .filter(|v| !v.is_empty())
        };

        PageStyle {
            overflow: get(PROPERTIES[0]),
            width: get(PROPERTIES[1]),
            height: get(PROPERTIES[2]),
            margin: get(PROPERTIES[3]),
        }
    }

    fn write_style(&mut self, values: &PageStyle) -> Result<(), PageError> {
        let style = self
            .declaration()
            .ok_or_else(|| PageError::Style(format!("no {:?} element", self)))?;
        let fields = [&values.overflow, &values.width, &values.height, &values.margin];

        for (name, value) in PROPERTIES.iter().zip(fields) {
            let result = match value {
                Some(v) => style.set_property(name, v),
                None => style.remove_property(name).map(|_| ()),
            };
            result.map_err(|e| PageError::Style(format!("{}: {:?}", name, e)))?;
        }

        Ok(())
    }
}

pub type WebPage = DocumentPage<InlineStyle>;

impl WebPage {
    pub fn new() -> Self {
        Self::with_targets(InlineStyle::Body, InlineStyle::Root)
    }
}

impl Default for WebPage {
    fn default() -> Self {
        Self::new()
    }
}
