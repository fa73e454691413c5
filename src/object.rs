use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::ast::{write_parameters, BlockStatement, Ident};
use crate::interpreter::RuntimeError;

pub type BuiltinFn = fn(&[Rc<Object>]) -> Result<Rc<Object>, RuntimeError>;

pub type Env = Rc<RefCell<Environment>>;

thread_local! {
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
    static NULL: Rc<Object> = Rc::new(Object::Null);
}

#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(String),
    Null,
    Array(Vec<Rc<Object>>),
    Function(Function),
    Builtin(Builtin),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    Boolean,
    Str,
    Null,
    Array,
    Function,
    Builtin,
    Error,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Str => "STRING",
            ObjectType::Null => "NULL",
            ObjectType::Array => "ARRAY",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}

/// A user function together with the environment it was defined in.
pub struct Function {
    pub parameters: Vec<Ident>,
    pub body: Rc<BlockStatement>,
    pub env: Env,
}

// the captured environment may hold this very function, so it is left out
impl Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl Object {
    /// The shared `true`/`false` instance for `value`.
    pub fn native_bool(value: bool) -> Rc<Object> {
        if value {
            TRUE.with(Rc::clone)
        } else {
            FALSE.with(Rc::clone)
        }
    }

    pub fn null() -> Rc<Object> {
        NULL.with(Rc::clone)
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Str(_) => ObjectType::Str,
            Object::Null => ObjectType::Null,
            Object::Array(_) => ObjectType::Array,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Error(_) => ObjectType::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

pub fn is_null(object: &Rc<Object>) -> bool {
    NULL.with(|null| Rc::ptr_eq(object, null))
}

/// `false` and null are the only falsy values, compared by identity.
pub fn is_truthy(object: &Rc<Object>) -> bool {
    let is_false = FALSE.with(|f| Rc::ptr_eq(object, f));
    !(is_false || is_null(object))
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Str(s) => write!(f, "{}", s),
            Object::Null => write!(f, "null"),
            Object::Array(elements) => {
                write!(f, "[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", el)?;
                }
                write!(f, "]")
            }
            Object::Function(func) => {
                write!(f, "fn(")?;
                write_parameters(f, &func.parameters)?;
                write!(f, ") {{\n{}\n}}", func.body)
            }
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

/// One lexical scope. Lookups fall through to `outer` until a binding is
/// found; the global scope has no outer.
#[derive(Default)]
pub struct Environment {
    store: HashMap<Ident, Rc<Object>>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enclosed(outer: Env) -> Self {
        Self {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    pub fn shared(self) -> Env {
        Rc::new(RefCell::new(self))
    }

    pub fn get(&self, name: &Ident) -> Option<Rc<Object>> {
        match self.store.get(name) {
            Some(value) => Some(Rc::clone(value)),
            None => self.outer.as_ref().and_then(|outer| outer.borrow().get(name)),
        }
    }

    pub fn set(&mut self, name: Ident, value: Rc<Object>) {
        self.store.insert(name, value);
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.store.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}
