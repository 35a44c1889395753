//! Arithmetic expressions, conditions and user-defined variables.
//!
//! Expressions are written with readable names and operators and rendered in
//! the URL form: `initialHeight * 2` becomes `ih_mul_2`, `width < 200`
//! becomes `w_lt_200`. Tokens starting with `$` are variable references and
//! are never rewritten.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CloudinaryError, Result};
use crate::transformation::value::ParamValue;

/// Operators and their URL codes. Multi-character operators come first so a
/// token is matched whole.
const OPERATORS: [(&str, &str); 15] = [
    ("&&", "and"),
    ("||", "or"),
    ("*", "mul"),
    ("/", "div"),
    ("+", "add"),
    ("-", "sub"),
    ("^", "pow"),
    ("notInside", "nin"),
    ("inside", "in"),
    ("<=", "lte"),
    (">=", "gte"),
    ("<", "lt"),
    (">", "gt"),
    ("!=", "ne"),
    ("=", "eq"),
];

/// Predefined asset properties, in both spellings.
const PROPERTIES: [(&str, &str); 24] = [
    ("width", "w"),
    ("height", "h"),
    ("initial_width", "iw"),
    ("initialWidth", "iw"),
    ("initial_height", "ih"),
    ("initialHeight", "ih"),
    ("aspect_ratio", "ar"),
    ("aspectRatio", "ar"),
    ("initial_aspect_ratio", "iar"),
    ("initialAspectRatio", "iar"),
    ("page_count", "pc"),
    ("pageCount", "pc"),
    ("face_count", "fc"),
    ("faceCount", "fc"),
    ("illustration_score", "ils"),
    ("illustrationScore", "ils"),
    ("current_page", "cp"),
    ("currentPage", "cp"),
    ("tags", "tags"),
    ("pageX", "px"),
    ("pageY", "py"),
    ("duration", "du"),
    ("initial_duration", "idu"),
    ("initialDuration", "idu"),
];

static SEPARATORS: OnceLock<Regex> = OnceLock::new();
static VARIABLE_NAME: OnceLock<Regex> = OnceLock::new();

fn separators() -> &'static Regex {
    SEPARATORS.get_or_init(|| Regex::new(r"[ _]+").expect("constant separator pattern"))
}

fn variable_name() -> &'static Regex {
    VARIABLE_NAME.get_or_init(|| {
        Regex::new(r"(?i)^\$[a-z][a-z0-9]*$").expect("constant variable name pattern")
    })
}

fn rewrite(token: &str) -> &str {
    if token.starts_with('$') {
        return token;
    }
    OPERATORS
        .iter()
        .chain(PROPERTIES.iter())
        .find(|&&(name, _)| name == token)
        .map_or(token, |&(_, code)| code)
}

/// An expression over asset properties, variables and numbers.
///
/// ```
/// use cld_core::transformation::Expression;
///
/// let e = Expression::initial_height().multiply(2);
/// assert_eq!(e.render().unwrap().as_deref(), Some("ih_mul_2"));
/// let e = Expression::new("width < 200 && faceCount >= 1");
/// assert_eq!(e.render().unwrap().as_deref(), Some("w_lt_200_and_fc_gte_1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    terms: Vec<ParamValue>,
}

impl Expression {
    /// Parse a whitespace separated expression such as `"initialWidth / 2"`.
    pub fn new(expression: &str) -> Self {
        Self {
            terms: vec![ParamValue::Text(expression.to_string())],
        }
    }

    fn property(name: &str) -> Self {
        Self::new(name)
    }

    pub fn width() -> Self {
        Self::property("width")
    }

    pub fn height() -> Self {
        Self::property("height")
    }

    pub fn initial_width() -> Self {
        Self::property("initialWidth")
    }

    pub fn initial_height() -> Self {
        Self::property("initialHeight")
    }

    pub fn aspect_ratio() -> Self {
        Self::property("aspectRatio")
    }

    pub fn initial_aspect_ratio() -> Self {
        Self::property("initialAspectRatio")
    }

    pub fn page_count() -> Self {
        Self::property("pageCount")
    }

    pub fn face_count() -> Self {
        Self::property("faceCount")
    }

    pub fn illustration_score() -> Self {
        Self::property("illustrationScore")
    }

    pub fn current_page() -> Self {
        Self::property("currentPage")
    }

    pub fn tags() -> Self {
        Self::property("tags")
    }

    pub fn page_x() -> Self {
        Self::property("pageX")
    }

    pub fn page_y() -> Self {
        Self::property("pageY")
    }

    pub fn duration() -> Self {
        Self::property("duration")
    }

    pub fn initial_duration() -> Self {
        Self::property("initialDuration")
    }

    /// A `$name` variable reference.
    pub fn variable(name: &str) -> Self {
        if name.starts_with('$') {
            Self::new(name)
        } else {
            Self::new(&format!("${}", name))
        }
    }

    fn push(mut self, operator: &str, operand: ParamValue) -> Self {
        self.terms.push(ParamValue::Text(operator.to_string()));
        self.terms.push(operand);
        self
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    pub fn plus(self, operand: impl Into<ParamValue>) -> Self {
        self.push("add", operand.into())
    }

    pub fn minus(self, operand: impl Into<ParamValue>) -> Self {
        self.push("sub", operand.into())
    }

    pub fn multiply(self, operand: impl Into<ParamValue>) -> Self {
        self.push("mul", operand.into())
    }

    pub fn divide(self, operand: impl Into<ParamValue>) -> Self {
        self.push("div", operand.into())
    }

    pub fn power(self, operand: impl Into<ParamValue>) -> Self {
        self.push("pow", operand.into())
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    pub fn equal(self, operand: impl Into<ParamValue>) -> Self {
        self.push("eq", operand.into())
    }

    pub fn not_equal(self, operand: impl Into<ParamValue>) -> Self {
        self.push("ne", operand.into())
    }

    pub fn less_than(self, operand: impl Into<ParamValue>) -> Self {
        self.push("lt", operand.into())
    }

    pub fn less_or_equal(self, operand: impl Into<ParamValue>) -> Self {
        self.push("lte", operand.into())
    }

    pub fn greater_than(self, operand: impl Into<ParamValue>) -> Self {
        self.push("gt", operand.into())
    }

    pub fn greater_or_equal(self, operand: impl Into<ParamValue>) -> Self {
        self.push("gte", operand.into())
    }

    /// `tags inside <list>`
    pub fn inside(self, operand: impl Into<ParamValue>) -> Self {
        self.push("in", operand.into())
    }

    pub fn not_inside(self, operand: impl Into<ParamValue>) -> Self {
        self.push("nin", operand.into())
    }

    // ========================================================================
    // Logic
    // ========================================================================

    pub fn and(mut self, other: impl Into<Expression>) -> Self {
        self.terms.push(ParamValue::Text("and".to_string()));
        self.terms.extend(other.into().terms);
        self
    }

    pub fn or(mut self, other: impl Into<Expression>) -> Self {
        self.terms.push(ParamValue::Text("or".to_string()));
        self.terms.extend(other.into().terms);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|term| match term {
            ParamValue::Text(text) => text.trim().is_empty(),
            _ => false,
        })
    }

    /// URL form of the expression, `None` when it has no terms.
    pub fn render(&self) -> Result<Option<String>> {
        let mut tokens = Vec::new();
        for term in &self.terms {
            let Some(text) = term.normalize()? else {
                continue;
            };
            match term {
                ParamValue::Text(_) => {
                    tokens.extend(text.split_whitespace().map(|t| rewrite(t).to_string()));
                }
                _ => tokens.push(text),
            }
        }
        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(Some(separators().replace_all(&tokens.join("_"), "_").into_owned()))
    }
}

impl From<&str> for Expression {
    fn from(expression: &str) -> Self {
        Expression::new(expression)
    }
}

impl From<String> for Expression {
    fn from(expression: String) -> Self {
        Expression::new(&expression)
    }
}

/// A user-defined variable, rendered as `$name_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    value: VariableValue,
}

#[derive(Debug, Clone, PartialEq)]
enum VariableValue {
    Value(ParamValue),
    Expression(Expression),
    List(Vec<String>),
}

impl Variable {
    /// Text values starting with `$` are read as expressions over other
    /// variables. The `$` prefix of `name` is optional.
    pub fn new(name: &str, value: impl Into<ParamValue>) -> Self {
        let value = match value.into() {
            ParamValue::Text(text) if text.starts_with('$') => {
                VariableValue::Expression(Expression::new(&text))
            }
            other => VariableValue::Value(other),
        };
        Self {
            name: with_prefix(name),
            value,
        }
    }

    pub fn expression(name: &str, expression: impl Into<Expression>) -> Self {
        Self {
            name: with_prefix(name),
            value: VariableValue::Expression(expression.into()),
        }
    }

    /// A list of strings, rendered as `!a:b:c!`.
    pub fn list<I, S>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: with_prefix(name),
            value: VariableValue::List(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `$name_value`, or `None` when the value is empty. A name that is not a
    /// letter followed by letters and digits is an error.
    pub fn render(&self) -> Result<Option<String>> {
        let value = match &self.value {
            VariableValue::Value(value) => value.normalize()?,
            VariableValue::Expression(expression) => expression.render()?,
            VariableValue::List(values) if values.is_empty() => None,
            VariableValue::List(values) => Some(format!("!{}!", values.join(":"))),
        };
        let Some(value) = value else {
            return Ok(None);
        };
        if !variable_name().is_match(&self.name) {
            return Err(CloudinaryError::invalid(format!(
                "Invalid variable name: {}",
                self.name
            )));
        }
        Ok(Some(format!("{}_{}", self.name, value)))
    }
}

fn with_prefix(name: &str) -> String {
    if name.starts_with('$') {
        name.to_string()
    } else {
        format!("${}", name)
    }
}
