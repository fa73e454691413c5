use std::rc::Rc;

use crate::interpreter::RuntimeError;
use crate::object::{Builtin, Object, ObjectType};

macro_rules! check_arity {
    ($args:expr, $want:expr) => {
        if $args.len() != $want {
            return Err(RuntimeError::WrongArgumentCount {
                got: $args.len(),
                want: $want,
            });
        }
    };
}

macro_rules! expect_array {
    ($name:ident, $val:expr) => {
        match &*$val {
            Object::Array(elements) => elements,
            other => {
                return Err(RuntimeError::ArgumentType {
                    function: stringify!($name),
                    expected: ObjectType::Array,
                    got: other.object_type(),
                })
            }
        }
    };
}

macro_rules! builtins {
    {
        $( fn $name:ident($args:ident) $body:block )*
    } => {
        $(
            fn $name($args: &[Rc<Object>]) -> Result<Rc<Object>, RuntimeError> $body
        )*

        pub const BUILTINS: &[Builtin] = &[
            $(
                Builtin {
                    name: stringify!($name),
                    func: $name,
                },
            )*
        ];
    };
}

fn integer(n: usize) -> Rc<Object> {
    Rc::new(Object::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
}

builtins! {
    fn len(args) {
        check_arity!(args, 1);
        match &*args[0] {
            Object::Str(s) => Ok(integer(s.chars().count())),
            Object::Array(elements) => Ok(integer(elements.len())),
            other => Err(RuntimeError::UnsupportedArgument {
                function: "len",
                got: other.object_type(),
            }),
        }
    }

    fn first(args) {
        check_arity!(args, 1);
        let elements = expect_array!(first, args[0]);
        Ok(elements.first().cloned().unwrap_or_else(Object::null))
    }

    fn last(args) {
        check_arity!(args, 1);
        let elements = expect_array!(last, args[0]);
        Ok(elements.last().cloned().unwrap_or_else(Object::null))
    }

    fn rest(args) {
        check_arity!(args, 1);
        let elements = expect_array!(rest, args[0]);
        match elements.split_first() {
            Some((_, tail)) => Ok(Rc::new(Object::Array(tail.to_vec()))),
            None => Ok(Object::null()),
        }
    }

    fn push(args) {
        check_arity!(args, 2);
        let elements = expect_array!(push, args[0]);
        let mut pushed = elements.clone();
        pushed.push(Rc::clone(&args[1]));
        Ok(Rc::new(Object::Array(pushed)))
    }
}

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}
