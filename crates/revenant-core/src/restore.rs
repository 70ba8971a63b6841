//! Instance construction and state restoration
//!
//! The default recipes never drop data and never fail: anything they do
//! not understand is stored verbatim under a fallback attribute and
//! reported as a [`Diagnostic`].

use crate::config::SessionOptions;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::object::Instance;
use crate::types::{BaseRepr, Constructor, Recipe, Reconstruct, StateApplier, TypeHandle};
use crate::value::Value;
use crate::{Error, Result};

/// Context handed to recipes while reconstructing
pub struct RestoreContext<'a> {
    /// Session options (fallback attribute names)
    pub options: &'a SessionOptions,
    /// Sink for non-fatal diagnostics
    pub diagnostics: &'a mut Diagnostics,
}

impl<'a> RestoreContext<'a> {
    /// Create a context
    pub fn new(options: &'a SessionOptions, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            options,
            diagnostics,
        }
    }
}

/// Construct an instance of `ty` using its recipe's constructor
pub fn construct(ty: &TypeHandle, args: Vec<Value>, ctx: &mut RestoreContext<'_>) -> Result<Instance> {
    match ty.recipe().constructor {
        Constructor::Default => Ok(default_construct(ty, args, ctx)),
        Constructor::TextWithFields(fields) => construct_text_with_fields(ty, fields, args),
        Constructor::Custom { func, .. } => func(ty, args, ctx),
    }
}

/// Default constructor
///
/// Produces an empty instance of the base representation. Arguments are
/// kept as a tuple under the constructor fallback attribute.
pub fn default_construct(ty: &TypeHandle, args: Vec<Value>, ctx: &mut RestoreContext<'_>) -> Instance {
    let mut instance = Instance::new(ty.clone());
    if !args.is_empty() {
        let attribute = ctx.options.new_args_attribute.clone();
        ctx.diagnostics
            .emit(Diagnostic::UnrecognizedConstructorArguments {
                type_name: ty.qualified_name().to_string(),
                count: args.len(),
                attribute: attribute.clone(),
            });
        instance.set(attribute, Value::Tuple(args));
    }
    instance
}

fn construct_text_with_fields(
    ty: &TypeHandle,
    fields: &[&str],
    args: Vec<Value>,
) -> Result<Instance> {
    if args.len() != fields.len() + 1 {
        return Err(Error::ConstructorArity {
            type_name: ty.qualified_name().to_string(),
            expected: fields.len() + 1,
            got: args.len(),
        });
    }

    let mut args = args.into_iter();
    let text = match args.next() {
        Some(Value::Str(text)) => text,
        other => {
            return Err(Error::ConstructorArgument {
                type_name: ty.qualified_name().to_string(),
                reason: format!(
                    "expected text as first argument, got {}",
                    other.as_ref().map_or("nothing", Value::type_name)
                ),
            })
        }
    };

    let mut instance = match ty.recipe().base {
        BaseRepr::Text => Instance::with_text(ty.clone(), text),
        BaseRepr::Object => {
            let mut instance = Instance::new(ty.clone());
            instance.set("value", Value::Str(text));
            instance
        }
    };
    for (field, value) in fields.iter().zip(args) {
        instance.set(*field, value);
    }
    Ok(instance)
}

/// Apply `state` to `instance` using `recipe`'s state applier
///
/// Custom appliers receive the payload unmodified.
pub fn apply_state_with(
    recipe: &Recipe,
    instance: &mut Instance,
    state: Value,
    ctx: &mut RestoreContext<'_>,
) -> Result<()> {
    match recipe.state {
        StateApplier::Mapping => {
            apply_mapping_state(instance, state, ctx);
            Ok(())
        }
        StateApplier::OrderedSlots { slots, reset } => {
            apply_ordered_slots(instance, state, slots, reset, ctx);
            Ok(())
        }
        StateApplier::Custom { func, .. } => func(instance, state, ctx),
    }
}

/// Apply `state` using the recipe of the instance's own type
pub fn apply_state(instance: &mut Instance, state: Value, ctx: &mut RestoreContext<'_>) -> Result<()> {
    let recipe = *instance.type_handle().recipe();
    apply_state_with(&recipe, instance, state, ctx)
}

/// Default state restoration
///
/// A two-element tuple whose elements are each absent or an
/// attribute-mapping is split into `(state, slotstate)` and each half is
/// handled on its own. Mappings are merged into the attribute set; any
/// other non-absent payload is kept under the state fallback attribute.
pub fn apply_mapping_state(instance: &mut Instance, state: Value, ctx: &mut RestoreContext<'_>) {
    let (state, slotstate) = split_slot_state(state);
    merge_half(instance, state, ctx);
    merge_half(instance, slotstate, ctx);
}

fn is_state_half(value: &Value) -> bool {
    value.is_none() || value.is_attribute_mapping()
}

fn split_slot_state(state: Value) -> (Value, Value) {
    match state {
        Value::Tuple(items) if items.len() == 2 && items.iter().all(is_state_half) => {
            let mut items = items.into_iter();
            let state = items.next().unwrap_or(Value::None);
            let slotstate = items.next().unwrap_or(Value::None);
            (state, slotstate)
        }
        other => (other, Value::None),
    }
}

fn merge_half(instance: &mut Instance, half: Value, ctx: &mut RestoreContext<'_>) {
    if half.is_none() {
        return;
    }
    if !half.is_attribute_mapping() {
        store_unrecognized(instance, half, ctx);
        return;
    }
    if let Some(entries) = half.into_attribute_entries() {
        instance.merge(entries);
    }
}

fn store_unrecognized(instance: &mut Instance, payload: Value, ctx: &mut RestoreContext<'_>) {
    let attribute = ctx.options.state_args_attribute.clone();
    ctx.diagnostics.emit(Diagnostic::UnrecognizedStateShape {
        type_name: instance.type_name().to_string(),
        shape: payload.type_name(),
        attribute: attribute.clone(),
    });
    instance.set(attribute, payload);
}

/// Ordered-slot state restoration
///
/// `state` must be a tuple or list with exactly one element per slot.
/// Elements map to the named slots (a `None` slot is discarded) and every
/// `reset` field is set to `Value::None`. Any other payload is kept under
/// the state fallback attribute.
pub fn apply_ordered_slots(
    instance: &mut Instance,
    state: Value,
    slots: &[Option<&str>],
    reset: &[&str],
    ctx: &mut RestoreContext<'_>,
) {
    let items = match state {
        Value::Tuple(items) | Value::List(items) if items.len() == slots.len() => items,
        other => {
            store_unrecognized(instance, other, ctx);
            return;
        }
    };

    for (slot, value) in slots.iter().zip(items) {
        if let Some(field) = slot {
            instance.set(*field, value);
        }
    }
    for field in reset {
        instance.set(*field, Value::None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaceholderType;

    const CODE_SLOTS: &[Option<&str>] = &[None, Some("source"), Some("location"), Some("mode")];

    fn placeholder(recipe: Recipe) -> TypeHandle {
        TypeHandle::placeholder(PlaceholderType::new("pkg", "Thing", recipe, false))
    }

    fn restore(instance: &mut Instance, state: Value) -> Diagnostics {
        let options = SessionOptions::default();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RestoreContext::new(&options, &mut diagnostics);
        apply_state(instance, state, &mut ctx).unwrap();
        diagnostics
    }

    #[test]
    fn test_pair_of_none_is_noop() {
        let mut instance = Instance::new(placeholder(Recipe::DEFAULT));
        let diagnostics = restore(&mut instance, Value::Tuple(vec![Value::None, Value::None]));
        assert_eq!(instance.attr_count(), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_pair_halves_are_merged() {
        let mut instance = Instance::new(placeholder(Recipe::DEFAULT));
        restore(
            &mut instance,
            Value::Tuple(vec![
                Value::attrs([("a", Value::Int(1))]),
                Value::attrs([("b", Value::Int(2))]),
            ]),
        );
        assert_eq!(instance.get("a"), Some(&Value::Int(1)));
        assert_eq!(instance.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_plain_mapping_overwrites() {
        let mut instance = Instance::new(placeholder(Recipe::DEFAULT));
        instance.set("a", Value::Int(0));
        restore(&mut instance, Value::attrs([("a", Value::Int(1))]));
        assert_eq!(instance.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_pair_with_non_mapping_is_not_split() {
        // (1, None) is not a (state, slotstate) pair, so it is kept whole
        let mut instance = Instance::new(placeholder(Recipe::DEFAULT));
        let state = Value::Tuple(vec![Value::Int(1), Value::None]);
        let diagnostics = restore(&mut instance, state.clone());
        assert_eq!(instance.get("_setstate_args"), Some(&state));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_unrecognized_state_is_kept() {
        let mut instance = Instance::new(placeholder(Recipe::DEFAULT));
        let diagnostics = restore(&mut instance, Value::List(vec![Value::Int(7)]));
        assert_eq!(
            instance.get("_setstate_args"),
            Some(&Value::List(vec![Value::Int(7)]))
        );
        assert!(matches!(
            &diagnostics.records()[0],
            Diagnostic::UnrecognizedStateShape { shape: "list", .. }
        ));
    }

    #[test]
    fn test_default_construct_keeps_arguments() {
        let ty = placeholder(Recipe::DEFAULT);
        let options = SessionOptions::default();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RestoreContext::new(&options, &mut diagnostics);

        let instance = construct(&ty, vec![Value::Int(1), Value::str("x")], &mut ctx).unwrap();
        assert_eq!(
            instance.get("_new_args"),
            Some(&Value::Tuple(vec![Value::Int(1), Value::str("x")]))
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_default_construct_without_arguments() {
        let ty = placeholder(Recipe::with_base(BaseRepr::Text));
        let options = SessionOptions::default();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RestoreContext::new(&options, &mut diagnostics);

        let instance = construct(&ty, vec![], &mut ctx).unwrap();
        assert_eq!(instance.text(), Some(""));
        assert_eq!(instance.attr_count(), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_text_with_fields() {
        const FIELDS: &[&str] = &["filename", "linenumber"];
        let ty = placeholder(
            Recipe::with_base(BaseRepr::Text).constructor(Constructor::TextWithFields(FIELDS)),
        );
        let options = SessionOptions::default();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RestoreContext::new(&options, &mut diagnostics);

        let instance = construct(
            &ty,
            vec![Value::str("x + 1"), Value::str("game.rpy"), Value::Int(12)],
            &mut ctx,
        )
        .unwrap();
        assert_eq!(instance.text(), Some("x + 1"));
        assert_eq!(instance.get("filename"), Some(&Value::str("game.rpy")));
        assert_eq!(instance.get("linenumber"), Some(&Value::Int(12)));

        let err = construct(&ty, vec![Value::str("x")], &mut ctx).unwrap_err();
        assert!(matches!(err, Error::ConstructorArity { expected: 3, got: 1, .. }));

        let err = construct(&ty, vec![Value::Int(1), Value::None, Value::None], &mut ctx)
            .unwrap_err();
        assert!(matches!(err, Error::ConstructorArgument { .. }));
    }

    #[test]
    fn test_ordered_slots() {
        let recipe = Recipe::DEFAULT.state(StateApplier::OrderedSlots {
            slots: CODE_SLOTS,
            reset: &["bytecode"],
        });
        let mut instance = Instance::new(placeholder(recipe));
        instance.set("bytecode", Value::Bytes(vec![1, 2, 3]));

        restore(
            &mut instance,
            Value::Tuple(vec![
                Value::Int(1),
                Value::str("a = 1"),
                Value::Tuple(vec![Value::str("game.rpy"), Value::Int(3)]),
                Value::str("exec"),
            ]),
        );
        assert_eq!(instance.get("source"), Some(&Value::str("a = 1")));
        assert_eq!(instance.get("mode"), Some(&Value::str("exec")));
        assert_eq!(instance.get("bytecode"), Some(&Value::None));
        assert_eq!(instance.attr_count(), 4);
    }

    #[test]
    fn test_ordered_slots_wrong_length_is_kept() {
        let recipe = Recipe::DEFAULT.state(StateApplier::OrderedSlots {
            slots: CODE_SLOTS,
            reset: &["bytecode"],
        });
        let mut instance = Instance::new(placeholder(recipe));
        let state = Value::Tuple(vec![Value::Int(1)]);
        let diagnostics = restore(&mut instance, state.clone());

        assert_eq!(instance.get("_setstate_args"), Some(&state));
        assert!(!instance.has("bytecode"));
        assert_eq!(diagnostics.len(), 1);
    }
}
