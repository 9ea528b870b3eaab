// ── Declarative field marshalling ──
//
// A `Queryable` type describes itself into a `Scope`: which converters it
// provides, which of its members are filled from which query command, and
// which nested objects carry fields of their own. The marshaller flattens
// that description into one command list, runs a single batched query, and
// writes every converted value back into its member.
//
// Converters are scoped per object. A nested object sees only the
// converters it registers itself; names are resolved when its scope is
// closed, so registration order inside `describe` does not matter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::CoreError;

/// Nested scopes allowed below the root object.
pub const MAX_PROPAGATION_DEPTH: usize = 16;

/// A named string → value transformation.
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Deserializes a converted value and returns the write into its member.
type Sink<'a> = Box<dyn FnOnce(Value) -> Result<Commit<'a>, String> + Send + 'a>;

/// A deserialized value, ready to be stored.
type Commit<'a> = Box<dyn FnOnce() + Send + 'a>;

/// A type whose members can be filled from router query values.
///
/// ```ignore
/// impl Queryable for Uptime {
///     fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
///         scope.converter("int", converters::uint);
///         scope.field("box:status/uptime", Some("int"), &mut self.seconds);
///     }
/// }
/// ```
pub trait Queryable {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>);
}

/// Anything that can resolve a list of commands to their raw values,
/// in request order.
pub trait QuerySource {
    fn query_values(
        &self,
        commands: &[String],
    ) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;
}

// ── Field descriptors ────────────────────────────────────────────────

/// One resolved query field: command, converter, and target member.
pub struct FieldDescriptor<'a> {
    command: String,
    converter: Converter,
    sink: Sink<'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Convert and deserialize `raw` without touching the target yet.
    fn stage(self, raw: &str) -> Result<Commit<'a>, CoreError> {
        let conversion_error = |message| CoreError::Conversion {
            command: self.command.clone(),
            message,
        };
        let value = (self.converter)(raw).map_err(conversion_error)?;
        trace!(command = %self.command, %value, "field converted");
        (self.sink)(value).map_err(conversion_error)
    }
}

impl std::fmt::Debug for FieldDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

fn identity(raw: &str) -> Result<Value, String> {
    Ok(Value::String(raw.to_owned()))
}

// ── Scope ────────────────────────────────────────────────────────────

enum Slot<'a> {
    /// Registered in this scope, converter not yet resolved.
    Pending {
        command: String,
        converter: Option<String>,
        sink: Sink<'a>,
    },
    /// Contributed by a propagated object, already resolved in its scope.
    Resolved(FieldDescriptor<'a>),
}

/// Registration surface handed to [`Queryable::describe`].
pub struct Scope<'a> {
    depth: usize,
    converters: HashMap<String, Converter>,
    slots: Vec<Slot<'a>>,
    error: Option<CoreError>,
}

impl<'a> Scope<'a> {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            converters: HashMap::new(),
            slots: Vec::new(),
            error: None,
        }
    }

    /// Provide a converter under `name` to the fields of this scope.
    pub fn converter<F>(&mut self, name: impl Into<String>, convert: F)
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.converters.insert(name.into(), Arc::new(convert));
    }

    /// Fill `target` from `command`, through the named converter if given
    /// or as the raw string otherwise.
    pub fn field<T>(&mut self, command: impl Into<String>, converter: Option<&str>, target: &'a mut T)
    where
        T: DeserializeOwned + Send + 'a,
    {
        let sink: Sink<'a> = Box::new(move |value| {
            let parsed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
            let commit: Commit<'a> = Box::new(move || *target = parsed);
            Ok(commit)
        });
        self.slots.push(Slot::Pending {
            command: command.into(),
            converter: converter.map(str::to_owned),
            sink,
        });
    }

    /// Include the fields of `nested`, described in a scope of its own.
    pub fn propagate<Q>(&mut self, nested: &'a mut Q)
    where
        Q: Queryable + ?Sized,
    {
        if self.error.is_some() {
            return;
        }
        let depth = self.depth + 1;
        if depth > MAX_PROPAGATION_DEPTH {
            self.fail(CoreError::PropagationTooDeep {
                limit: MAX_PROPAGATION_DEPTH,
            });
            return;
        }

        let mut child = Scope::new(depth);
        nested.describe(&mut child);
        match child.close() {
            Ok(fields) => self.slots.extend(fields.into_iter().map(Slot::Resolved)),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: CoreError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Resolve converter names against this scope and yield the fields in
    /// discovery order.
    fn close(self) -> Result<Vec<FieldDescriptor<'a>>, CoreError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let converters = self.converters;

        self.slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Resolved(field) => Ok(field),
                Slot::Pending {
                    command,
                    converter: None,
                    sink,
                } => Ok(FieldDescriptor {
                    command,
                    converter: Arc::new(identity),
                    sink,
                }),
                Slot::Pending {
                    command,
                    converter: Some(name),
                    sink,
                } => match converters.get(&name) {
                    Some(converter) => Ok(FieldDescriptor {
                        command,
                        converter: Arc::clone(converter),
                        sink,
                    }),
                    None => Err(CoreError::ConverterNotFound { name, command }),
                },
            })
            .collect()
    }
}

// ── Marshaller ───────────────────────────────────────────────────────

/// The flattened field list of one object graph.
#[derive(Debug)]
pub struct Marshaller<'a> {
    fields: Vec<FieldDescriptor<'a>>,
}

impl<'a> Marshaller<'a> {
    /// Walk `target` and resolve every field. Fails on unknown converter
    /// names and runaway nesting, before anything touches the network.
    pub fn collect<Q>(target: &'a mut Q) -> Result<Self, CoreError>
    where
        Q: Queryable + ?Sized,
    {
        let mut scope = Scope::new(0);
        target.describe(&mut scope);
        let fields = scope.close()?;
        debug!(fields = fields.len(), "collected query fields");
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDescriptor<'a>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Commands in discovery order.
    pub fn commands(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.command.clone()).collect()
    }

    /// Convert `values` (one per field, same order) and write them back.
    ///
    /// Every value is converted before the first member is written, so a
    /// failure leaves the target untouched.
    pub fn apply(self, values: Vec<String>) -> Result<(), CoreError> {
        if values.len() != self.fields.len() {
            return Err(CoreError::protocol(format!(
                "requested {} values, received {}",
                self.fields.len(),
                values.len()
            )));
        }
        let staged = self
            .fields
            .into_iter()
            .zip(values)
            .map(|(field, raw)| field.stage(&raw))
            .collect::<Result<Vec<_>, _>>()?;
        for commit in staged {
            commit();
        }
        Ok(())
    }
}

/// Fill `target` with one batched query against `source`.
pub async fn marshal<Q, S>(target: &mut Q, source: &S) -> Result<(), CoreError>
where
    Q: Queryable + ?Sized,
    S: QuerySource + ?Sized,
{
    let marshaller = Marshaller::collect(target)?;
    if marshaller.is_empty() {
        return Ok(());
    }
    let values = source.query_values(&marshaller.commands()).await?;
    marshaller.apply(values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::converters;
    use pretty_assertions::assert_eq;

    // ── Fixtures ─────────────────────────────────────────────────────

    #[derive(Default)]
    struct StubSource {
        answers: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
        calls: AtomicUsize,
        /// Answer with this many values regardless of the request.
        force_len: Option<usize>,
    }

    impl StubSource {
        fn with(answers: &[(&str, &str)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl QuerySource for StubSource {
        async fn query_values(&self, commands: &[String]) -> Result<Vec<String>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().extend_from_slice(commands);
            let mut values: Vec<String> = commands
                .iter()
                .map(|c| self.answers.get(c).cloned().unwrap_or_default())
                .collect();
            if let Some(n) = self.force_len {
                values.resize(n, String::new());
            }
            Ok(values)
        }
    }

    #[derive(Debug, Default)]
    struct Single {
        value: i64,
    }

    impl Queryable for Single {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.converter("Int", converters::int);
            scope.field("x", Some("Int"), &mut self.value);
        }
    }

    #[derive(Debug, Default)]
    struct Unknown {
        value: i64,
    }

    impl Queryable for Unknown {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.field("x", Some("Nope"), &mut self.value);
        }
    }

    #[derive(Debug, Default)]
    struct Inner {
        b: String,
        c: u64,
    }

    impl Queryable for Inner {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.field("b", None, &mut self.b);
            scope.field("c", Some("count"), &mut self.c);
            scope.converter("count", converters::uint);
        }
    }

    #[derive(Debug, Default)]
    struct Outer {
        a: String,
        inner: Inner,
        d: bool,
    }

    impl Queryable for Outer {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.converter("flag", converters::bool);
            scope.field("a", None, &mut self.a);
            scope.propagate(&mut self.inner);
            scope.field("d", Some("flag"), &mut self.d);
        }
    }

    /// Uses a converter only its parent provides.
    #[derive(Debug, Default)]
    struct Borrower {
        value: i64,
    }

    impl Queryable for Borrower {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.field("y", Some("Int"), &mut self.value);
        }
    }

    #[derive(Debug, Default)]
    struct Lender {
        value: i64,
        nested: Borrower,
    }

    impl Queryable for Lender {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.converter("Int", converters::int);
            scope.field("x", Some("Int"), &mut self.value);
            scope.propagate(&mut self.nested);
        }
    }

    #[derive(Debug, Default)]
    struct Chain {
        value: u32,
        next: Option<Box<Chain>>,
    }

    impl Chain {
        fn of_length(n: usize) -> Self {
            let mut head = Chain::default();
            for _ in 1..n {
                head = Chain {
                    value: 0,
                    next: Some(Box::new(head)),
                };
            }
            head
        }
    }

    impl Queryable for Chain {
        fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
            scope.converter("n", converters::uint);
            scope.field("v", Some("n"), &mut self.value);
            if let Some(next) = self.next.as_deref_mut() {
                scope.propagate(next);
            }
        }
    }

    // ── Tests ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn named_converter_round_trip() {
        let source = StubSource::with(&[("x", "5")]);
        let mut target = Single::default();

        marshal(&mut target, &source).await.unwrap();

        assert_eq!(target.value, 5);
        assert_eq!(*source.requested.lock().unwrap(), vec!["x".to_owned()]);
    }

    #[tokio::test]
    async fn unknown_converter_fails_before_query() {
        let source = StubSource::with(&[("x", "5")]);
        let mut target = Unknown::default();

        let err = marshal(&mut target, &source).await.unwrap_err();

        assert!(
            matches!(&err, CoreError::ConverterNotFound { name, command } if name == "Nope" && command == "x"),
            "got {err:?}"
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(target.value, 0);
    }

    #[tokio::test]
    async fn propagation_keeps_discovery_order() {
        let source = StubSource::with(&[("a", "alpha"), ("b", "beta"), ("c", "42"), ("d", "1")]);
        let mut target = Outer::default();

        marshal(&mut target, &source).await.unwrap();

        assert_eq!(*source.requested.lock().unwrap(), ["a", "b", "c", "d"]);
        assert_eq!(target.a, "alpha");
        assert_eq!(target.inner.b, "beta");
        assert_eq!(target.inner.c, 42);
        assert!(target.d);
    }

    #[test]
    fn converters_do_not_cross_propagation() {
        let mut target = Lender::default();
        let err = Marshaller::collect(&mut target).unwrap_err();
        assert!(
            matches!(&err, CoreError::ConverterNotFound { command, .. } if command == "y"),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn count_mismatch_is_protocol_error() {
        let source = StubSource {
            force_len: Some(3),
            ..StubSource::default()
        };
        let mut target = Single::default();

        let err = marshal(&mut target, &source).await.unwrap_err();
        assert!(matches!(err, CoreError::Protocol { .. }), "got {err:?}");
        assert_eq!(target.value, 0);
    }

    #[tokio::test]
    async fn failed_conversion_names_the_command() {
        let source = StubSource::with(&[("x", "five")]);
        let mut target = Single::default();

        let err = marshal(&mut target, &source).await.unwrap_err();
        assert!(
            matches!(&err, CoreError::Conversion { command, .. } if command == "x"),
            "got {err:?}"
        );
    }

    #[test]
    fn failed_field_leaves_earlier_fields_untouched() {
        #[derive(Default)]
        struct Pair {
            label: String,
            count: i64,
        }
        impl Queryable for Pair {
            fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
                scope.converter("Int", converters::int);
                scope.field("label", None, &mut self.label);
                scope.field("count", Some("Int"), &mut self.count);
            }
        }

        let mut target = Pair {
            label: "before".into(),
            count: 1,
        };
        let marshaller = Marshaller::collect(&mut target).unwrap();
        let err = marshaller
            .apply(vec!["written".into(), "notanint".into()])
            .unwrap_err();

        assert!(
            matches!(&err, CoreError::Conversion { command, .. } if command == "count"),
            "got {err:?}"
        );
        assert_eq!(target.label, "before");
        assert_eq!(target.count, 1);
    }

    #[test]
    fn failed_deserialization_leaves_target_untouched() {
        #[derive(Default)]
        struct Narrow {
            first: u8,
            second: u8,
        }
        impl Queryable for Narrow {
            fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
                scope.converter("n", converters::uint);
                scope.field("first", Some("n"), &mut self.first);
                scope.field("second", Some("n"), &mut self.second);
            }
        }

        let mut target = Narrow::default();
        let err = Marshaller::collect(&mut target)
            .unwrap()
            .apply(vec!["7".into(), "300".into()])
            .unwrap_err();

        assert!(
            matches!(&err, CoreError::Conversion { command, .. } if command == "second"),
            "got {err:?}"
        );
        assert_eq!(target.first, 0);
    }

    #[test]
    fn identity_converter_yields_raw_string() {
        #[derive(Default)]
        struct Raw {
            text: String,
        }
        impl Queryable for Raw {
            fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
                scope.field("t", None, &mut self.text);
            }
        }

        let mut target = Raw::default();
        let marshaller = Marshaller::collect(&mut target).unwrap();
        assert_eq!(marshaller.commands(), ["t"]);
        marshaller.apply(vec!["  as is ".into()]).unwrap();
        assert_eq!(target.text, "  as is ");
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let mut chain = Chain::of_length(MAX_PROPAGATION_DEPTH + 1);
        let marshaller = Marshaller::collect(&mut chain).unwrap();
        assert_eq!(marshaller.len(), MAX_PROPAGATION_DEPTH + 1);
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let mut chain = Chain::of_length(MAX_PROPAGATION_DEPTH + 2);
        let err = Marshaller::collect(&mut chain).unwrap_err();
        assert!(matches!(err, CoreError::PropagationTooDeep { limit } if limit == MAX_PROPAGATION_DEPTH));
    }

    #[tokio::test]
    async fn empty_object_skips_the_query() {
        struct Nothing;
        impl Queryable for Nothing {
            fn describe<'a>(&'a mut self, _scope: &mut Scope<'a>) {}
        }

        let source = StubSource::default();
        marshal(&mut Nothing, &source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
