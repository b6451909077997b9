//! The built-in list type: a heap-owned growable sequence shared by
//! reference, with a small set of Python-flavoured methods.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::NativeFunction;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct LoxList {
    pub elements: Vec<Value>,
}

impl LoxList {
    pub fn new(elements: Vec<Value>) -> Self {
        LoxList { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Translate a possibly-negative index, wrapping once from the end.
    /// `-1` is the last element; anything still out of range is `None`.
    pub fn normalize_index(&self, index: f64) -> Option<usize> {
        let mut index = index as i64;

        if index < 0 {
            index += self.elements.len() as i64;
        }

        if index < 0 || index as usize >= self.elements.len() {
            None
        } else {
            Some(index as usize)
        }
    }
}

impl fmt::Display for LoxList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }

            // Strings are quoted inside a list so elements stay separable.
            match element {
                Value::String(s) => write!(f, "\"{}\"", s)?,

                other => write!(f, "{}", other)?,
            }
        }

        write!(f, "]")
    }
}

/// Method dispatch on a list value. Each lookup produces a fresh native
/// callable bound to the receiving list.
pub fn bound_method(list: &Rc<RefCell<LoxList>>, name: &str) -> Option<Rc<NativeFunction>> {
    match name {
        "append" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "append",
                1,
                Box::new(move |_, args| {
                    receiver.borrow_mut().elements.push(args[0].clone());

                    Ok(Value::List(Rc::clone(&receiver)))
                }),
            ))
        }

        "extend" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "extend",
                1,
                Box::new(move |_, args| match &args[0] {
                    Value::List(other) => {
                        let incoming: Vec<Value> = other.borrow().elements.clone();

                        receiver.borrow_mut().elements.extend(incoming);

                        Ok(Value::List(Rc::clone(&receiver)))
                    }

                    other => Err(format!("extend() expects a list, got {}.", other.type_name())),
                }),
            ))
        }

        "pop" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "pop",
                0,
                Box::new(move |_, _| {
                    receiver
                        .borrow_mut()
                        .elements
                        .pop()
                        .ok_or_else(|| "Can't pop from an empty list.".to_string())
                }),
            ))
        }

        "remove" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "remove",
                1,
                Box::new(move |_, args| match &args[0] {
                    Value::Number(n) => {
                        let index = receiver
                            .borrow()
                            .normalize_index(*n)
                            .ok_or_else(|| "Index out of bounds.".to_string())?;

                        receiver.borrow_mut().elements.remove(index);

                        Ok(Value::List(Rc::clone(&receiver)))
                    }

                    other => Err(format!(
                        "remove() expects a number index, got {}.",
                        other.type_name()
                    )),
                }),
            ))
        }

        "insert" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "insert",
                2,
                Box::new(move |_, args| match &args[0] {
                    Value::Number(n) => {
                        let index = *n as i64;
                        let len = receiver.borrow().len() as i64;

                        // Inserting at the end is legal, unlike reads.
                        if index < 0 || index > len {
                            return Err("Index out of bounds.".to_string());
                        }

                        receiver
                            .borrow_mut()
                            .elements
                            .insert(index as usize, args[1].clone());

                        Ok(Value::List(Rc::clone(&receiver)))
                    }

                    other => Err(format!(
                        "insert() expects a number index, got {}.",
                        other.type_name()
                    )),
                }),
            ))
        }

        "concat" => {
            let receiver = Rc::clone(list);

            Some(NativeFunction::new(
                "concat",
                1,
                Box::new(move |_, args| match &args[0] {
                    Value::List(other) => {
                        let mut combined: Vec<Value> = receiver.borrow().elements.clone();

                        combined.extend(other.borrow().elements.iter().cloned());

                        Ok(Value::List(Rc::new(RefCell::new(LoxList::new(combined)))))
                    }

                    other => Err(format!("concat() expects a list, got {}.", other.type_name())),
                }),
            ))
        }

        _ => None,
    }
}
