//! Scripted stack-machine decoder for integration tests
//!
//! Replays a fixed list of opcodes against a set of decode hooks, the way a
//! real stream interpreter would.

#![allow(dead_code)]

use revenant_core::{DecodeHooks, Decoder, Error, Result, Value};
use std::collections::HashMap;

/// One scripted instruction
#[derive(Debug, Clone)]
pub enum Op {
    /// Push a literal value
    Push(Value),
    /// Resolve a type and push it
    Global(&'static str, &'static str),
    /// Push a mark for the next `Tuple`
    Mark,
    /// Pop everything down to the last mark into a tuple
    Tuple,
    /// Pop alternating keys and values down to the last mark into a dict
    Dict,
    /// Pop an argument tuple and a type, construct, push the object
    NewObj,
    /// Pop a state payload and apply it to the object on top of the stack
    Build,
    /// Store the top of the stack in the memo
    Put(usize),
    /// Push a memoised value
    Get(usize),
}

enum Slot {
    Mark,
    Value(Value),
}

/// Decoder that replays `ops` and returns the final top of the stack
pub struct ScriptDecoder {
    ops: Vec<Op>,
}

impl ScriptDecoder {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }
}

fn underflow() -> Error {
    Error::Decode("stack underflow".to_string())
}

fn pop(stack: &mut Vec<Slot>) -> Result<Value> {
    match stack.pop() {
        Some(Slot::Value(value)) => Ok(value),
        Some(Slot::Mark) => Err(Error::Decode("unexpected mark".to_string())),
        None => Err(underflow()),
    }
}

fn pop_to_mark(stack: &mut Vec<Slot>) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    loop {
        match stack.pop() {
            Some(Slot::Mark) => break,
            Some(Slot::Value(value)) => items.push(value),
            None => return Err(underflow()),
        }
    }
    items.reverse();
    Ok(items)
}

impl Decoder for ScriptDecoder {
    fn decode(&mut self, hooks: &mut dyn DecodeHooks) -> Result<Value> {
        let mut stack: Vec<Slot> = Vec::new();
        let mut memo: HashMap<usize, Value> = HashMap::new();

        for op in self.ops.clone() {
            match op {
                Op::Push(value) => stack.push(Slot::Value(value)),
                Op::Global(module, name) => {
                    let ty = hooks.find_class(module, name)?;
                    stack.push(Slot::Value(Value::Type(ty)));
                }
                Op::Mark => stack.push(Slot::Mark),
                Op::Tuple => {
                    let items = pop_to_mark(&mut stack)?;
                    stack.push(Slot::Value(Value::Tuple(items)));
                }
                Op::Dict => {
                    let items = pop_to_mark(&mut stack)?;
                    if items.len() % 2 != 0 {
                        return Err(Error::Decode("odd number of dict items".to_string()));
                    }
                    let mut entries = Vec::with_capacity(items.len() / 2);
                    let mut items = items.into_iter();
                    while let (Some(key), Some(value)) = (items.next(), items.next()) {
                        entries.push((key, value));
                    }
                    stack.push(Slot::Value(Value::Dict(entries)));
                }
                Op::NewObj => {
                    let args = match pop(&mut stack)? {
                        Value::Tuple(args) => args,
                        other => return Err(Error::Decode(format!("bad args: {:?}", other))),
                    };
                    let ty = match pop(&mut stack)? {
                        Value::Type(ty) => ty,
                        other => return Err(Error::Decode(format!("bad class: {:?}", other))),
                    };
                    let obj = hooks.construct(&ty, args)?;
                    stack.push(Slot::Value(Value::Object(obj)));
                }
                Op::Build => {
                    let state = pop(&mut stack)?;
                    match stack.last() {
                        Some(Slot::Value(Value::Object(obj))) => hooks.apply_state(obj, state)?,
                        _ => return Err(Error::Decode("build target is not an object".to_string())),
                    }
                }
                Op::Put(index) => match stack.last() {
                    Some(Slot::Value(value)) => {
                        memo.insert(index, value.clone());
                    }
                    _ => return Err(underflow()),
                },
                Op::Get(index) => {
                    let value = memo
                        .get(&index)
                        .cloned()
                        .ok_or_else(|| Error::Decode(format!("memo {} missing", index)))?;
                    stack.push(Slot::Value(value));
                }
            }
        }

        pop(&mut stack)
    }
}
