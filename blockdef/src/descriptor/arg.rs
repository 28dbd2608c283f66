/// One entry of a dropdown field: what the user sees and what the generator receives.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        DropdownOption {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The editor widget behind an argument slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    /// Enumerated choice (`field_dropdown`).
    Dropdown(Vec<DropdownOption>),
    /// Free text (`field_input`).
    Text { default: String },
    /// Numeric entry (`field_number`).
    Number { default: f64 },
}

/// A named argument slot of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
}

impl ArgSpec {
    /// Dropdown argument whose options use the same string as label and value.
    pub fn dropdown<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                DropdownOption::new(v.clone(), v)
            })
            .collect();
        ArgSpec {
            name: name.into(),
            kind: ArgKind::Dropdown(options),
        }
    }

    pub fn dropdown_labeled(name: impl Into<String>, options: Vec<DropdownOption>) -> Self {
        ArgSpec {
            name: name.into(),
            kind: ArgKind::Dropdown(options),
        }
    }

    pub fn text(name: impl Into<String>, default: impl Into<String>) -> Self {
        ArgSpec {
            name: name.into(),
            kind: ArgKind::Text {
                default: default.into(),
            },
        }
    }

    pub fn number(name: impl Into<String>, default: f64) -> Self {
        ArgSpec {
            name: name.into(),
            kind: ArgKind::Number { default },
        }
    }

    pub fn options(&self) -> Option<&[DropdownOption]> {
        match &self.kind {
            ArgKind::Dropdown(options) => Some(options),
            _ => None,
        }
    }

    /// Whether `value` is something this field's editor could have produced.
    /// Text fields accept anything; numbers must parse.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.kind {
            ArgKind::Dropdown(options) => options.iter().any(|o| o.value == value),
            ArgKind::Text { .. } => true,
            ArgKind::Number { .. } => value.trim().parse::<f64>().is_ok(),
        }
    }

    /// Display label for a bound value, falling back to the value itself.
    pub fn label_for<'a>(&'a self, value: &'a str) -> &'a str {
        self.options()
            .and_then(|opts| opts.iter().find(|o| o.value == value))
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }

    /// The value a freshly placed block starts with.
    pub fn default_value(&self) -> String {
        match &self.kind {
            ArgKind::Dropdown(options) => options
                .first()
                .map(|o| o.value.clone())
                .unwrap_or_default(),
            ArgKind::Text { default } => default.clone(),
            ArgKind::Number { default } => default.to_string(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ArgKind::Dropdown(_) => "dropdown",
            ArgKind::Text { .. } => "text",
            ArgKind::Number { .. } => "number",
        }
    }
}
