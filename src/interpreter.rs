use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{BlockStatement, Expression, Ident, InfixOperator, PrefixOperator, Program, Statement};
use crate::builtin;
use crate::object::{is_truthy, Env, Environment, Function, Object, ObjectType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: ObjectType,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ObjectType,
        operator: InfixOperator,
        right: ObjectType,
    },
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: InfixOperator,
        right: ObjectType,
    },
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),
    #[error("not a function: {0}")]
    NotAFunction(ObjectType),
    #[error("index operator not supported: {0}")]
    IndexNotSupported(ObjectType),
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("argument to `{function}` not supported, got {got}")]
    UnsupportedArgument {
        function: &'static str,
        got: ObjectType,
    },
    #[error("argument to `{function}` must be {expected}, got {got}")]
    ArgumentType {
        function: &'static str,
        expected: ObjectType,
        got: ObjectType,
    },
    #[error("division by zero")]
    DivisionByZero,
}

/// Why evaluation of a statement list stopped early.
///
/// `Return` carries the value of a `return` statement up to the nearest
/// function call (or the top level); `Error` keeps going past call
/// boundaries.
#[derive(Debug)]
enum Unwind {
    Return(Rc<Object>),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Unwind::Error(e)
    }
}

type Flow<T> = Result<T, Unwind>;

/// Evaluates `program` against `env`.
///
/// Returns `None` when the last statement produced no value (an empty
/// program, or one ending in `let`). Runtime failures come back as
/// `Object::Error`.
pub fn eval(program: &Program, env: &Env) -> Option<Rc<Object>> {
    match eval_statements(&program.statements, env) {
        Ok(value) => value,
        Err(Unwind::Return(value)) => Some(value),
        Err(Unwind::Error(e)) => {
            debug!(error = %e, "runtime error");
            Some(Rc::new(Object::Error(e.to_string())))
        }
    }
}

fn eval_statements(statements: &[Statement], env: &Env) -> Flow<Option<Rc<Object>>> {
    let mut result = None;
    for statement in statements {
        result = eval_statement(statement, env)?;
    }
    Ok(result)
}

fn eval_block(block: &BlockStatement, env: &Env) -> Flow<Rc<Object>> {
    Ok(eval_statements(&block.statements, env)?.unwrap_or_else(Object::null))
}

fn eval_statement(statement: &Statement, env: &Env) -> Flow<Option<Rc<Object>>> {
    match statement {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env)?;
            env.borrow_mut().set(*name, value);
            Ok(None)
        }
        Statement::Return(value) => Err(Unwind::Return(eval_expression(value, env)?)),
        Statement::Expression(expression) => eval_expression(expression, env).map(Some),
    }
}

fn eval_expression(expression: &Expression, env: &Env) -> Flow<Rc<Object>> {
    match expression {
        Expression::Identifier(name) => Ok(eval_identifier(name, env)?),
        Expression::Integer(n) => Ok(Rc::new(Object::Integer(*n))),
        Expression::Str(s) => Ok(Rc::new(Object::Str(s.clone()))),
        Expression::Boolean(b) => Ok(Object::native_bool(*b)),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env)?;
            Ok(eval_prefix(*operator, &right)?)
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            Ok(eval_infix(*operator, &left, &right)?)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env)?;
            if is_truthy(&condition) {
                eval_block(consequence, env)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env)
            } else {
                Ok(Object::null())
            }
        }
        Expression::Function { parameters, body } => Ok(Rc::new(Object::Function(Function {
            parameters: parameters.clone(),
            body: Rc::clone(body),
            env: Rc::clone(env),
        }))),
        Expression::Call {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env)?;
            let arguments = eval_expressions(arguments, env)?;
            apply_function(&function, &arguments)
        }
        Expression::Array(elements) => Ok(Rc::new(Object::Array(eval_expressions(elements, env)?))),
        Expression::Index { left, index } => {
            let left = eval_expression(left, env)?;
            let index = eval_expression(index, env)?;
            Ok(eval_index(&left, &index)?)
        }
    }
}

// left to right, stopping at the first failure
fn eval_expressions(expressions: &[Expression], env: &Env) -> Flow<Vec<Rc<Object>>> {
    expressions
        .iter()
        .map(|e| eval_expression(e, env))
        .collect()
}

fn eval_identifier(name: &Ident, env: &Env) -> Result<Rc<Object>, RuntimeError> {
    let bound = env.borrow().get(name);
    bound
        .or_else(|| builtin::lookup(name.as_str()).map(|b| Rc::new(Object::Builtin(b))))
        .ok_or_else(|| RuntimeError::IdentifierNotFound(name.as_str().to_string()))
}

fn apply_function(function: &Rc<Object>, arguments: &[Rc<Object>]) -> Flow<Rc<Object>> {
    match &**function {
        Object::Function(function) => {
            if arguments.len() != function.parameters.len() {
                return Err(RuntimeError::WrongArgumentCount {
                    got: arguments.len(),
                    want: function.parameters.len(),
                }
                .into());
            }
            trace!(arguments = arguments.len(), "calling function");

            let mut scope = Environment::enclosed(Rc::clone(&function.env));
            for (parameter, argument) in function.parameters.iter().zip(arguments) {
                scope.set(*parameter, Rc::clone(argument));
            }

            match eval_block(&function.body, &scope.shared()) {
                Err(Unwind::Return(value)) => Ok(value),
                result => result,
            }
        }
        Object::Builtin(builtin) => {
            trace!(builtin = builtin.name, arguments = arguments.len(), "calling builtin");
            Ok((builtin.func)(arguments)?)
        }
        other => Err(RuntimeError::NotAFunction(other.object_type()).into()),
    }
}

fn eval_prefix(operator: PrefixOperator, right: &Rc<Object>) -> Result<Rc<Object>, RuntimeError> {
    match operator {
        PrefixOperator::Bang => Ok(Object::native_bool(!is_truthy(right))),
        PrefixOperator::Minus => match **right {
            Object::Integer(n) => Ok(Rc::new(Object::Integer(n.wrapping_neg()))),
            _ => Err(RuntimeError::UnknownPrefixOperator {
                operator,
                operand: right.object_type(),
            }),
        },
    }
}

fn eval_infix(
    operator: InfixOperator,
    left: &Rc<Object>,
    right: &Rc<Object>,
) -> Result<Rc<Object>, RuntimeError> {
    match (&**left, &**right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::Str(l), Object::Str(r)) => match operator {
            InfixOperator::Plus => Ok(Rc::new(Object::Str(format!("{}{}", l, r)))),
            _ => Err(RuntimeError::UnknownInfixOperator {
                left: ObjectType::Str,
                operator,
                right: ObjectType::Str,
            }),
        },
        _ if left.object_type() != right.object_type() => Err(RuntimeError::TypeMismatch {
            left: left.object_type(),
            operator,
            right: right.object_type(),
        }),
        // booleans and null are singletons, so identity is equality
        _ => match operator {
            InfixOperator::Eq => Ok(Object::native_bool(Rc::ptr_eq(left, right))),
            InfixOperator::NotEq => Ok(Object::native_bool(!Rc::ptr_eq(left, right))),
            _ => Err(RuntimeError::UnknownInfixOperator {
                left: left.object_type(),
                operator,
                right: right.object_type(),
            }),
        },
    }
}

fn eval_integer_infix(operator: InfixOperator, l: i64, r: i64) -> Result<Rc<Object>, RuntimeError> {
    let value = match operator {
        InfixOperator::Plus => l.wrapping_add(r),
        InfixOperator::Minus => l.wrapping_sub(r),
        InfixOperator::Asterisk => l.wrapping_mul(r),
        InfixOperator::Slash => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l.wrapping_div(r)
        }
        InfixOperator::Lt => return Ok(Object::native_bool(l < r)),
        InfixOperator::Gt => return Ok(Object::native_bool(l > r)),
        InfixOperator::Eq => return Ok(Object::native_bool(l == r)),
        InfixOperator::NotEq => return Ok(Object::native_bool(l != r)),
    };
    Ok(Rc::new(Object::Integer(value)))
}

fn eval_index(left: &Rc<Object>, index: &Rc<Object>) -> Result<Rc<Object>, RuntimeError> {
    match (&**left, &**index) {
        (Object::Array(elements), Object::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or_else(Object::null)),
        _ => Err(RuntimeError::IndexNotSupported(left.object_type())),
    }
}
