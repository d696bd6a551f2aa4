//! Recursive expansion of a schema into a tree of generated nodes.
//!
//! [`BulkGenerator`] owns a [`Schema`] plus the collaborators used while
//! expanding it: the template engine, an optional field schema, an optional
//! [`ModelResolver`] and the dimension generator registry.
//!
//! # Expansion
//!
//! For every node definition:
//!
//! 1. `extends` is merged in from the named template (once, not chained)
//! 2. every dimension is resolved to its tokens, with the positional `count`
//! 3. the cartesian product of all axes gives the instances, last axis fastest;
//!    without dimensions there is exactly one instance
//! 4. per instance, `global_context` is rendered, then `generate`
//! 5. `child` is merged into every entry of `childs` (or becomes the only one)
//! 6. per instance, the first child whose `parent_name_match` renders truthy
//!    is expanded with the instance's child context as `par`
//!
//! A node with `childs` where no entry matches an instance fails with
//! [`BulkError::NoChildMatch`]. Expansion is depth-first and the first error
//! aborts the whole request.
//!
//! The instances of every node are counted from the dimension lengths before
//! they are built and taken from a budget of [`GeneratorOptions::max_nodes`];
//! once it is exhausted expansion stops with [`BulkError::TooManyNodes`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkgen_cli::generator::BulkGenerator;
//! use bulkgen_cli::schema::{DocumentFormat, Schema};
//!
//! # fn main() -> bulkgen_cli::core::Result<()> {
//! let schema = Schema::parse(
//!     r#"{"version": "1.0.0", "output": {"dimensions": ["A-C"], "generate": {"name": "{{ dim.1 }}"}}}"#,
//!     DocumentFormat::Json,
//! )?;
//! let nodes = BulkGenerator::new(schema).generate()?;
//! assert_eq!(nodes.len(), 3);
//! # Ok(())
//! # }
//! ```

use std::cell::Cell;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::{SerializeTuple, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DEFAULT_PARENT_NAME_MATCH, ENGINE_VERSION};
use crate::core::{BulkError, Result};
use crate::dimensions::DimensionResolver;
use crate::fields::{CompiledGenerate, FieldCompiler, FieldMap, ModelResolver, UnknownFieldPolicy};
use crate::generators::GeneratorRegistry;
use crate::schema::{NodeDefinition, Schema, apply_base_child, merge};
use crate::templating::context::match_vars;
use crate::templating::{CompiledBindings, CompiledTemplate, Context, DimValue, TemplateEngine, TeraEngine};
use crate::utils::{did_you_mean, is_truthy};

/// Engine-level settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Deepest allowed nesting of node definitions
    pub max_depth: usize,
    /// Handling of `generate` keys missing from the field schema
    pub unknown_fields: UnknownFieldPolicy,
    /// Most nodes a single request may generate, counted before each level is built
    pub max_nodes: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_fields: UnknownFieldPolicy::default(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// One generated instance and its subtree
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNode {
    /// Rendered and cast field values
    pub fields: Map<String, Value>,
    /// Nodes generated by the matching child definition
    pub children: Vec<GeneratedNode>,
}

impl GeneratedNode {
    /// Number of nodes in this subtree, this one included.
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        1 + count_nodes(&self.children)
    }
}

/// Number of nodes in a generated forest.
#[must_use]
pub fn count_nodes(nodes: &[GeneratedNode]) -> usize {
    nodes.iter().map(GeneratedNode::count_nodes).sum()
}

/// Serialized as a `[fields, children]` pair.
impl Serialize for GeneratedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.fields)?;
        tuple.serialize_element(&self.children)?;
        tuple.end()
    }
}

/// Expands a [`Schema`] into [`GeneratedNode`]s
pub struct BulkGenerator {
    schema: Schema,
    fields: Option<FieldMap>,
    engine: Arc<dyn TemplateEngine>,
    resolver: Option<Arc<dyn ModelResolver>>,
    dimensions: DimensionResolver,
    options: GeneratorOptions,
}

impl BulkGenerator {
    /// Generator with the Tera engine, no field schema and default options.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            fields: None,
            engine: Arc::new(TeraEngine::new()),
            resolver: None,
            dimensions: DimensionResolver::default(),
            options: GeneratorOptions::default(),
        }
    }

    /// Check `generate` against a field schema instead of accepting any key.
    #[must_use]
    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = Some(fields);
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Verify `model-reference` ids against the host's store.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ModelResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Use a registry with additional dimension generators.
    #[must_use]
    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.dimensions = DimensionResolver::new(registry);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// The schema as given.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Version gate and input application.
    fn prepare(&self) -> Result<Schema> {
        self.schema.check_version(ENGINE_VERSION)?;
        let mut schema = self.schema.clone();
        schema.apply_input(self.engine.as_ref())?;
        Ok(schema)
    }

    fn expansion<'a>(&'a self, schema: &'a Schema) -> Expansion<'a> {
        Expansion {
            schema,
            inp: schema.input_map(),
            engine: self.engine.as_ref(),
            fields: FieldCompiler::new(self.engine.as_ref(), self.fields.as_ref())
                .with_unknown_fields(self.options.unknown_fields)
                .with_resolver(self.resolver.clone()),
            dimensions: &self.dimensions,
            max_depth: self.options.max_depth,
            max_nodes: self.options.max_nodes,
            remaining: Cell::new(self.options.max_nodes),
        }
    }

    /// Check the schema without expanding any dimension.
    ///
    /// Runs the version gate, applies input, then visits every reachable node
    /// definition: resolves `extends`, compiles all templates and collects
    /// missing required fields. Templates reached again through their own
    /// childs are visited once.
    ///
    /// # Errors
    ///
    /// The first problem found, see [`BulkError`].
    pub fn validate(&self) -> Result<()> {
        let schema = self.prepare()?;
        debug!("Validating schema v{} with {} templates", schema.version, schema.templates.len());
        self.expansion(&schema).check(&schema.output, 0, &mut Vec::new())
    }

    /// Expand the schema with an empty parent context.
    ///
    /// # Errors
    ///
    /// The first problem found, see [`BulkError`]. No partial result is
    /// returned.
    pub fn generate(&self) -> Result<Vec<GeneratedNode>> {
        self.generate_with_parent(Value::Object(Map::new()))
    }

    /// Expand the schema with `parent` visible as `par` at the top level.
    ///
    /// # Errors
    ///
    /// See [`BulkGenerator::generate`].
    pub fn generate_with_parent(&self, parent: Value) -> Result<Vec<GeneratedNode>> {
        let schema = self.prepare()?;
        let nodes = self.expansion(&schema).expand(&schema.output, &parent, 0)?;
        debug!("Generated {} nodes", count_nodes(&nodes));
        Ok(nodes)
    }
}

struct Expansion<'a> {
    schema: &'a Schema,
    inp: Map<String, Value>,
    engine: &'a dyn TemplateEngine,
    fields: FieldCompiler<'a>,
    dimensions: &'a DimensionResolver,
    max_depth: usize,
    max_nodes: usize,
    /// Nodes that may still be generated
    remaining: Cell<usize>,
}

/// Tokens of every axis in product order, last axis fastest.
fn cartesian(axes: &[Vec<String>]) -> Vec<Vec<DimValue>> {
    axes.iter().fold(vec![Vec::new()], |product, axis| {
        product
            .into_iter()
            .flat_map(|prefix| {
                axis.iter().map(move |token| {
                    let mut next = prefix.clone();
                    next.push(DimValue {
                        token: token.clone(),
                        len: axis.len(),
                    });
                    next
                })
            })
            .collect()
    })
}

/// Describe an instance for [`BulkError::NoChildMatch`].
fn describe_instance(fields: &Map<String, Value>, dims: &[DimValue], index: usize) -> String {
    if let Some(Value::String(name)) = fields.get("name") {
        return name.clone();
    }
    if !dims.is_empty() {
        return dims.iter().map(|d| d.token.as_str()).collect::<Vec<_>>().join(", ");
    }
    index.to_string()
}

impl Expansion<'_> {
    fn resolve_extends(&self, node: &NodeDefinition) -> Result<NodeDefinition> {
        let Some(name) = node.extends.as_deref() else {
            return Ok(node.clone());
        };
        let template = self.schema.template(name).ok_or_else(|| BulkError::UnknownTemplateReference {
            name: name.to_string(),
            closest: did_you_mean(name, self.schema.templates.iter().map(|t| t.name.as_str())).map(str::to_string),
        })?;
        trace!("Merging template '{}'", name);
        Ok(merge(node.clone(), &template.definition))
    }

    fn childs_of(node: &NodeDefinition) -> Vec<NodeDefinition> {
        match node.child.as_deref() {
            Some(base) => apply_base_child(node.childs.clone(), base),
            None => node.childs.clone(),
        }
    }

    fn compile_generate(&self, node: &NodeDefinition) -> Result<CompiledGenerate> {
        self.fields.compile(&node.generate)
    }

    fn compile_global(&self, node: &NodeDefinition) -> Result<Option<Box<dyn CompiledBindings>>> {
        match node.global_context.as_deref() {
            Some(source) if !source.trim().is_empty() => self
                .engine
                .compile_bindings(source)
                .map(Some)
                .map_err(|e| e.into_bulk_error(source).at_path("global_context")),
            _ => Ok(None),
        }
    }

    fn compile_match(&self, child: &NodeDefinition) -> Result<Box<dyn CompiledTemplate>> {
        let source = child.parent_name_match.as_deref().unwrap_or(DEFAULT_PARENT_NAME_MATCH);
        self.engine.compile(source).map_err(|e| e.into_bulk_error(source))
    }

    fn axis_count(node: &NodeDefinition, axis: usize) -> Result<Option<usize>> {
        match node.count.get(axis).and_then(Option::as_ref) {
            Some(spec) => spec.resolve().map_err(|reason| BulkError::SchemaShapeInvalid {
                path: format!("count.{axis}"),
                reason,
            }),
            None => Ok(None),
        }
    }

    /// Take the instances of `node` from the node budget before any of them is built.
    fn reserve(&self, node: &NodeDefinition) -> Result<usize> {
        let mut instances = 1usize;
        for (i, dimension) in node.dimensions.iter().enumerate() {
            let len = self.dimensions.resolved_len(dimension, Self::axis_count(node, i)?)?;
            instances = instances.saturating_mul(len);
        }

        let remaining = self.remaining.get();
        if instances > remaining {
            return Err(BulkError::TooManyNodes {
                max_nodes: self.max_nodes,
            });
        }
        self.remaining.set(remaining - instances);
        Ok(instances)
    }

    fn resolve_axes(&self, node: &NodeDefinition) -> Result<Vec<Vec<String>>> {
        node.dimensions
            .iter()
            .enumerate()
            .map(|(i, dimension)| {
                let tokens = self.dimensions.resolve(dimension, Self::axis_count(node, i)?)?;
                trace!("Dimension '{}' resolved to {} tokens", dimension, tokens.len());
                Ok(tokens)
            })
            .collect()
    }

    fn expand(&self, node: &NodeDefinition, parent: &Value, depth: usize) -> Result<Vec<GeneratedNode>> {
        if depth > self.max_depth {
            return Err(BulkError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }

        let node = self.resolve_extends(node)?;
        let generate = self.compile_generate(&node)?;
        let global = self.compile_global(&node)?;

        let reserved = self.reserve(&node)?;
        trace!("Reserved {} nodes, {} left", reserved, self.remaining.get());
        let product = cartesian(&self.resolve_axes(&node)?);
        let len = product.len();
        debug!("Expanding node at depth {} into {} instances", depth, len);

        let mut instances = Vec::with_capacity(len);
        for dims in product {
            let context = Context::new(self.inp.clone(), parent.clone(), len, dims);
            let context = match &global {
                Some(bindings) => {
                    let values = bindings
                        .render(&context.to_value())
                        .map_err(|e| e.into_bulk_error(bindings.source()).at_path("global_context"))?;
                    context.with_global(values)
                }
                None => context,
            };
            let fields = generate.render(&context.to_value())?;
            let child_context = context.child_context(&fields);
            instances.push((fields, child_context, context));
        }

        let childs = Self::childs_of(&node);
        let matchers = childs.iter().map(|child| self.compile_match(child)).collect::<Result<Vec<_>>>()?;

        let mut nodes = Vec::with_capacity(len);
        for (index, (fields, child_context, context)) in instances.into_iter().enumerate() {
            let mut children = Vec::new();
            if !childs.is_empty() {
                let vars = match_vars(&self.inp, &child_context);
                let mut selected = None;
                for (position, matcher) in matchers.iter().enumerate() {
                    let rendered = matcher.render(&vars).map_err(|e| e.into_bulk_error(matcher.source()))?;
                    if is_truthy(&rendered) {
                        selected = Some(position);
                        break;
                    }
                }

                let Some(position) = selected else {
                    return Err(BulkError::NoChildMatch {
                        instance: describe_instance(&fields, context.dims(), index),
                    });
                };
                trace!("Instance {} matched child {}", index, position);
                children = self.expand(&childs[position], &child_context, depth + 1)?;
            }
            nodes.push(GeneratedNode {
                fields,
                children,
            });
        }

        Ok(nodes)
    }

    fn check(&self, node: &NodeDefinition, depth: usize, visiting: &mut Vec<String>) -> Result<()> {
        if depth > self.max_depth {
            return Err(BulkError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        if let Some(name) = node.extends.as_deref() {
            if visiting.iter().any(|visited| visited == name) {
                return Ok(());
            }
            visiting.push(name.to_string());
        }

        let resolved = self.resolve_extends(node)?;
        self.compile_generate(&resolved)?;
        self.compile_global(&resolved)?;
        for child in Self::childs_of(&resolved) {
            self.compile_match(&child)?;
            self.check(&child, depth + 1, visiting)?;
        }

        if node.extends.is_some() {
            visiting.pop();
        }
        Ok(())
    }
}
