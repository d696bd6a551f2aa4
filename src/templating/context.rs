//! Template context of one generated instance.
//!
//! A [`Context`] is built fresh for every instance and never changes after
//! construction. Templates see it as these variables:
//!
//! | Variable     | Content                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `inp`        | schema input values                                       |
//! | `dim.N`      | token of axis `N` (1-based) for this instance             |
//! | `dim_len.N`  | number of tokens on axis `N`                              |
//! | `len`        | number of instances generated by this node definition     |
//! | `par`        | context handed down by the parent instance                |
//! | `global`     | bindings of the node's `global_context`                   |
//!
//! The context handed down to children (see [`Context::child_context`]) has
//! `dim`, `dim_len`, `len` and `par` of the parent instance plus its rendered
//! fields as `gen`, so a grandchild reads its grandparent's name as
//! `par.par.gen.name`.

use serde_json::{Map, Value};

/// One axis value of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimValue {
    /// Token of the axis for this instance
    pub token: String,
    /// Number of tokens the axis resolved to
    pub len: usize,
}

/// Immutable variables of one generated instance
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    inp: Map<String, Value>,
    dim: Vec<DimValue>,
    par: Value,
    len: usize,
    global: Map<String, Value>,
}

impl Context {
    /// Create the context of one instance.
    #[must_use]
    pub fn new(inp: Map<String, Value>, par: Value, len: usize, dim: Vec<DimValue>) -> Self {
        Self {
            inp,
            dim,
            par,
            len,
            global: Map::new(),
        }
    }

    /// Same context with `global` bindings set.
    #[must_use]
    pub fn with_global(mut self, global: Map<String, Value>) -> Self {
        self.global = global;
        self
    }

    /// Schema input values.
    #[must_use]
    pub fn inp(&self) -> &Map<String, Value> {
        &self.inp
    }

    /// Value of a 1-based axis.
    #[must_use]
    pub fn dim(&self, axis: usize) -> Option<&DimValue> {
        axis.checked_sub(1).and_then(|index| self.dim.get(index))
    }

    /// All axis values in order.
    #[must_use]
    pub fn dims(&self) -> &[DimValue] {
        &self.dim
    }

    /// Context handed down by the parent instance.
    #[must_use]
    pub fn par(&self) -> &Value {
        &self.par
    }

    /// Number of sibling instances, this one included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the node produced no instances at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bindings of the node's `global_context`.
    #[must_use]
    pub fn global(&self) -> &Map<String, Value> {
        &self.global
    }

    fn dim_maps(&self) -> (Value, Value) {
        let mut tokens = Map::new();
        let mut lengths = Map::new();
        for (index, value) in self.dim.iter().enumerate() {
            let axis = (index + 1).to_string();
            tokens.insert(axis.clone(), Value::String(value.token.clone()));
            lengths.insert(axis, Value::from(value.len));
        }
        (Value::Object(tokens), Value::Object(lengths))
    }

    /// Variables for rendering `generate` and `global_context`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let (dim, dim_len) = self.dim_maps();
        let mut vars = Map::new();
        vars.insert("inp".to_string(), Value::Object(self.inp.clone()));
        vars.insert("dim".to_string(), dim);
        vars.insert("dim_len".to_string(), dim_len);
        vars.insert("len".to_string(), Value::from(self.len));
        vars.insert("par".to_string(), self.par.clone());
        vars.insert("global".to_string(), Value::Object(self.global.clone()));
        Value::Object(vars)
    }

    /// Context children of this instance see as `par`.
    #[must_use]
    pub fn child_context(&self, generated: &Map<String, Value>) -> Value {
        let (dim, dim_len) = self.dim_maps();
        let mut vars = Map::new();
        vars.insert("dim".to_string(), dim);
        vars.insert("dim_len".to_string(), dim_len);
        vars.insert("len".to_string(), Value::from(self.len));
        vars.insert("par".to_string(), self.par.clone());
        vars.insert("gen".to_string(), Value::Object(generated.clone()));
        Value::Object(vars)
    }
}

/// Variables for rendering a child's `parent_name_match`.
#[must_use]
pub fn match_vars(inp: &Map<String, Value>, child_context: &Value) -> Value {
    let mut vars = Map::new();
    vars.insert("inp".to_string(), Value::Object(inp.clone()));
    vars.insert("par".to_string(), child_context.clone());
    Value::Object(vars)
}

/// Variables for rendering schema `dimensions` and `count` entries.
#[must_use]
pub fn input_vars(inp: &Map<String, Value>) -> Value {
    let mut vars = Map::new();
    vars.insert("inp".to_string(), Value::Object(inp.clone()));
    Value::Object(vars)
}
