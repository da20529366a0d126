//! Positional arguments built from an inbound request.
use std::any::{self, Any};

use crate::{ErrorKind, Result};


/// One decoded positional argument.
pub type Param = Box<dyn Any + Send>;


/// Describes one declared field of a method's arguments structure.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct ArgDescriptor {
    /// Field name, as declared in the arguments structure
    pub name: &'static str,
    /// Type name: last path segment for composite types, full type otherwise
    pub type_name: &'static str,
    /// True when the value is built through the struct argument builder
    pub composite: bool,
}

/// Synthetic arguments value of a positional-style method: the ordered fields
/// of its `{Service}{Method}Args` structure.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct ArgsDescriptor {
    pub name: &'static str,
    pub args: &'static [ArgDescriptor],
}

impl ArgsDescriptor {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}


/// Ordered positional values, moved out one by one into the stub call.
#[derive(Default)]
pub struct Params {
    values: Vec<Option<Param>>,
}

impl Params {
    pub fn new(values: Vec<Param>) -> Self {
        Self { values: values.into_iter().map(Some).collect() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append a value at the end.
    pub fn push(&mut self, value: Param) {
        self.values.push(Some(value))
    }

    /// Move the value at `index` out, as `T`.
    pub fn take<T: Any>(&mut self, index: usize) -> Result<T> {
        let value = match self.values.get_mut(index) {
            Some(slot) => match slot.take() {
                Some(value) => value,
                None => return ErrorKind::Decode.err(format!("parameter {} already taken", index)),
            },
            None => return ErrorKind::Decode.err(
                format!("parameter {} out of range ({} parameters)", index, self.values.len())),
        };

        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => {
                // keep the value for a retry with the right type
                self.values[index] = Some(value);
                ErrorKind::Decode.err(format!("parameter {} is not a {}", index, any::type_name::<T>()))
            }
        }
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Params")
         .field("len", &self.values.len())
         .field("taken", &self.values.iter().filter(|v| v.is_none()).count())
         .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect;

    #[test]
    fn test_take_in_order() {
        let mut params = Params::new(vec![Box::new(13i32) as Param, Box::new(String::from("name"))]);
        assert_eq!(params.take::<i32>(0), Ok(13));
        assert_eq!(params.take::<String>(1), Ok(String::from("name")));
    }

    #[test]
    fn test_take_twice() {
        let mut params = Params::new(vec![Box::new(1u8) as Param]);
        assert_eq!(params.take::<u8>(0), Ok(1));
        expect!(params.take::<u8>(0), Err(crate::Error { kind: ErrorKind::Decode, .. }));
    }

    #[test]
    fn test_take_wrong_type() {
        let mut params = Params::new(vec![Box::new(1u8) as Param]);
        expect!(params.take::<i64>(0), Err(crate::Error { kind: ErrorKind::Decode, .. }));
        // the value survives a mistyped take
        assert_eq!(params.take::<u8>(0), Ok(1));
    }

    #[test]
    fn test_take_out_of_range() {
        let mut params = Params::default();
        expect!(params.take::<u8>(3), Err(crate::Error { kind: ErrorKind::Decode, .. }));
    }
}
