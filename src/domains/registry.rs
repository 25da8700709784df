//! Declarative form metadata: each domain describes its fields and
//! operations as static tables and projects them into per-operation
//! form configs for the presentation layer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Url,
    Select,
    Hidden,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldConfig {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub placeholder: Option<&'static str>,
    /// Choices for `Select` fields; empty otherwise.
    pub options: &'static [&'static str],
}

impl FieldConfig {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            placeholder: None,
            options: &[],
        }
    }

    pub const fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub const fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub const fn with_options(mut self, options: &'static [&'static str]) -> Self {
        self.kind = FieldKind::Select;
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmitConfig {
    pub label: &'static str,
    pub pending: &'static str,
}

/// Everything the UI needs to render one operation of a domain.
#[derive(Debug, Clone, Copy)]
pub struct OperationConfig {
    pub label: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldConfig],
    pub submit: SubmitConfig,
    /// Set on destructive operations.
    pub confirm_message: Option<&'static str>,
}

/// The form-shaped projection of an `OperationConfig`.
#[derive(Debug, Clone, Copy)]
pub struct FormConfig {
    pub label: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldConfig],
    pub submit: SubmitConfig,
}

impl OperationConfig {
    pub fn form(&self) -> FormConfig {
        FormConfig {
            label: self.label,
            description: self.description,
            fields: self.fields,
            submit: self.submit,
        }
    }
}
