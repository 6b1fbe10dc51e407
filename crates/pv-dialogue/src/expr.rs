//! Integer, duration, and string expressions.
//!
//! Every expression is built once by the document compiler and evaluated
//! against a live [`Dialogue`]. Evaluation never mutates the conversation;
//! [`Assignment`] is the only write path and is driven by effects.

use std::fmt;

use pv_core::stat::Stat;
use pv_core::vars::parse_int;
use pv_core::world::WeatherField;
use pv_core::{Role, TimeDuration, TimePoint, Tripoint};

use crate::dialogue::Dialogue;
use crate::error::{DialogueError, DialogueResult};

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    /// On one of the speakers.
    Actor(Role),
    /// In the world's global store.
    Global,
}

impl VarScope {
    /// Read the raw text of a variable.
    pub fn read(self, d: &Dialogue<'_>, name: &str) -> Option<String> {
        match self {
            VarScope::Actor(role) => d.actor(role).get_value(name),
            VarScope::Global => d.world().globals().get(name).map(str::to_string),
        }
    }

    /// Write a variable.
    pub fn write(self, d: &mut Dialogue<'_>, name: &str, value: &str) {
        match self {
            VarScope::Actor(role) => d.actor_mut(role).set_value(name, value),
            VarScope::Global => d.world_mut().globals_mut().set(name, value),
        }
    }
}

/// A binary integer operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

impl ArithOp {
    const SYMBOLS: &'static [(&'static str, ArithOp)] = &[
        ("+", ArithOp::Add),
        ("-", ArithOp::Sub),
        ("*", ArithOp::Mul),
        ("/", ArithOp::Div),
        ("%", ArithOp::Rem),
        ("&", ArithOp::BitAnd),
        ("|", ArithOp::BitOr),
        ("^", ArithOp::BitXor),
        ("<<", ArithOp::Shl),
        (">>", ArithOp::Shr),
    ];

    /// Look up an operator by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::SYMBOLS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, op)| *op)
    }

    /// Look up the operator of a compound assignment such as `+=`.
    ///
    /// Only the arithmetic forms `+= -= *= /= %=` exist.
    pub fn from_compound(symbol: &str) -> Option<Self> {
        match symbol {
            "+=" => Some(ArithOp::Add),
            "-=" => Some(ArithOp::Sub),
            "*=" => Some(ArithOp::Mul),
            "/=" => Some(ArithOp::Div),
            "%=" => Some(ArithOp::Rem),
            _ => None,
        }
    }

    /// The operator's symbol.
    pub fn symbol(self) -> &'static str {
        Self::SYMBOLS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }

    /// Apply the operator with two's-complement wrapping.
    pub fn apply(self, a: i64, b: i64) -> DialogueResult<i64> {
        let value = match self {
            ArithOp::Add => a.wrapping_add(b),
            ArithOp::Sub => a.wrapping_sub(b),
            ArithOp::Mul => a.wrapping_mul(b),
            ArithOp::Div if b == 0 => return Err(DialogueError::DivisionByZero("/")),
            ArithOp::Div => a.wrapping_div(b),
            ArithOp::Rem if b == 0 => return Err(DialogueError::DivisionByZero("%")),
            ArithOp::Rem => a.wrapping_rem(b),
            ArithOp::BitAnd => a & b,
            ArithOp::BitOr => a | b,
            ArithOp::BitXor => a ^ b,
            ArithOp::Shl => {
                let shift = u32::try_from(b).map_err(|_| DialogueError::ShiftOutOfRange(b))?;
                a.checked_shl(shift)
                    .ok_or(DialogueError::ShiftOutOfRange(b))?
            }
            ArithOp::Shr => {
                let shift = u32::try_from(b).map_err(|_| DialogueError::ShiftOutOfRange(b))?;
                a.checked_shr(shift)
                    .ok_or(DialogueError::ShiftOutOfRange(b))?
            }
        };
        Ok(value)
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Look up a comparison by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            ">" => CompareOp::Gt,
            "<=" => CompareOp::Le,
            ">=" => CompareOp::Ge,
            _ => return None,
        };
        Some(op)
    }

    /// Compare two values.
    pub fn test(self, a: i64, b: i64) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Gt => a > b,
            CompareOp::Le => a <= b,
            CompareOp::Ge => a >= b,
        }
    }
}

/// An integer-valued expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntExpr {
    /// A literal.
    Const(i64),
    /// A uniform draw from `0..=n`.
    Rand(i64),
    /// Time since the start of the game, in whole `unit` turns.
    TimeSinceCataclysm {
        /// Turns per unit.
        unit: i64,
    },
    /// A numeric weather field.
    Weather(WeatherField),
    /// A speaker stat.
    Stat {
        /// Whose stat.
        role: Role,
        /// Which stat.
        stat: Stat,
    },
    /// A variable read as an integer.
    Var {
        /// Where the variable lives.
        scope: VarScope,
        /// Full variable key.
        name: String,
        /// Value when the variable is not set.
        default: i64,
    },
    /// Turns since the variable was stamped with the time, or -1 if unset.
    TimeSinceVar {
        /// Whose variable.
        role: Role,
        /// Full variable key.
        name: String,
    },
    /// A skill level.
    SkillLevel {
        /// Whose skill.
        role: Role,
        /// Skill id.
        skill: String,
    },
    /// How many of an item a speaker carries.
    ItemCount {
        /// Whose inventory.
        role: Role,
        /// Item type id.
        item: String,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: ArithOp,
        /// Left operand.
        lhs: Box<IntExpr>,
        /// Right operand.
        rhs: Box<IntExpr>,
    },
    /// Bitwise negation.
    BitNot(Box<IntExpr>),
}

impl IntExpr {
    /// Build a binary operation.
    pub fn binary(op: ArithOp, lhs: IntExpr, rhs: IntExpr) -> Self {
        IntExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluate against a live conversation.
    pub fn evaluate(&self, d: &Dialogue<'_>) -> DialogueResult<i64> {
        let value = match self {
            IntExpr::Const(n) => *n,
            IntExpr::Rand(n) => d.random_range(0, *n),
            IntExpr::TimeSinceCataclysm { unit } => d.world().now().turn() / (*unit).max(1),
            IntExpr::Weather(field) => d.world().weather().field(*field),
            IntExpr::Stat { role, stat } => d.actor(*role).stat(*stat),
            IntExpr::Var {
                scope,
                name,
                default,
            } => match scope.read(d, name) {
                Some(text) => parse_int(name, Some(&text))?,
                None => *default,
            },
            IntExpr::TimeSinceVar { role, name } => match d.actor(*role).get_value(name) {
                Some(text) => {
                    let stamped = parse_int(name, Some(&text))?;
                    d.world().now().turn().wrapping_sub(stamped)
                }
                None => -1,
            },
            IntExpr::SkillLevel { role, skill } => i64::from(d.actor(*role).skill_level(skill)),
            IntExpr::ItemCount { role, item } => d.actor(*role).charges_of(item),
            IntExpr::Binary { op, lhs, rhs } => op.apply(lhs.evaluate(d)?, rhs.evaluate(d)?)?,
            IntExpr::BitNot(inner) => !inner.evaluate(d)?,
        };
        Ok(value)
    }
}

/// A duration-valued expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationExpr {
    /// A fixed duration, possibly permanent.
    Fixed(TimeDuration),
    /// An integer expression counted in turns.
    Turns(IntExpr),
}

impl Default for DurationExpr {
    fn default() -> Self {
        DurationExpr::Fixed(TimeDuration::ZERO)
    }
}

impl DurationExpr {
    /// Evaluate against a live conversation.
    pub fn evaluate(&self, d: &Dialogue<'_>) -> DialogueResult<TimeDuration> {
        match self {
            DurationExpr::Fixed(duration) => Ok(*duration),
            DurationExpr::Turns(expr) => Ok(TimeDuration::from_turns(expr.evaluate(d)?)),
        }
    }
}

/// A writable integer destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntTarget {
    /// A writable speaker stat.
    Stat {
        /// Whose stat.
        role: Role,
        /// Which stat.
        stat: Stat,
    },
    /// A variable, stored as decimal text.
    Var {
        /// Where the variable lives.
        scope: VarScope,
        /// Full variable key.
        name: String,
    },
    /// Stamp a variable so that its time-since reads the assigned value.
    TimeSinceVar {
        /// Whose variable.
        role: Role,
        /// Full variable key.
        name: String,
    },
    /// A skill level.
    SkillLevel {
        /// Whose skill.
        role: Role,
        /// Skill id.
        skill: String,
    },
    /// The game clock, in whole `unit` turns.
    Clock {
        /// Turns per unit.
        unit: i64,
    },
    /// A numeric weather field.
    Weather(WeatherField),
}

impl IntTarget {
    /// The expression that reads this target's current value.
    pub fn as_expr(&self) -> IntExpr {
        match self {
            IntTarget::Stat { role, stat } => IntExpr::Stat {
                role: *role,
                stat: *stat,
            },
            IntTarget::Var { scope, name } => IntExpr::Var {
                scope: *scope,
                name: name.clone(),
                default: 0,
            },
            IntTarget::TimeSinceVar { role, name } => IntExpr::TimeSinceVar {
                role: *role,
                name: name.clone(),
            },
            IntTarget::SkillLevel { role, skill } => IntExpr::SkillLevel {
                role: *role,
                skill: skill.clone(),
            },
            IntTarget::Clock { unit } => IntExpr::TimeSinceCataclysm { unit: *unit },
            IntTarget::Weather(field) => IntExpr::Weather(*field),
        }
    }

    /// Store a value.
    pub fn write(&self, d: &mut Dialogue<'_>, value: i64) {
        match self {
            IntTarget::Stat { role, stat } => d.actor_mut(*role).set_stat(*stat, value),
            IntTarget::Var { scope, name } => scope.write(d, name, &value.to_string()),
            IntTarget::TimeSinceVar { role, name } => {
                let stamped = d.world().now().turn().wrapping_sub(value);
                d.actor_mut(*role).set_value(name, &stamped.to_string());
            }
            IntTarget::SkillLevel { role, skill } => {
                let level = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
                d.actor_mut(*role).set_skill_level(skill, level);
            }
            IntTarget::Clock { unit } => {
                let now = TimePoint::from_turn(value.saturating_mul((*unit).max(1)));
                d.world_mut().set_now(now);
            }
            IntTarget::Weather(field) => d.world_mut().set_weather_field(*field, value),
        }
    }
}

/// `target = value`, the write side of the arithmetic mini-language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Where the result goes.
    pub target: IntTarget,
    /// What is stored.
    pub value: IntExpr,
}

impl Assignment {
    /// `target = value`.
    pub fn new(target: IntTarget, value: IntExpr) -> Self {
        Self { target, value }
    }

    /// `target op= rhs`.
    pub fn compound(target: IntTarget, op: ArithOp, rhs: IntExpr) -> Self {
        let value = IntExpr::binary(op, target.as_expr(), rhs);
        Self { target, value }
    }

    /// `target++` or `target--`.
    pub fn step(target: IntTarget, delta: i64) -> Self {
        Self::compound(target, ArithOp::Add, IntExpr::Const(delta))
    }

    /// Evaluate the value, then store it.
    pub fn apply(&self, d: &mut Dialogue<'_>) -> DialogueResult<()> {
        let value = self.value.evaluate(d)?;
        self.target.write(d, value);
        Ok(())
    }
}

/// A string-valued operand of `compare_string`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrExpr {
    /// A literal.
    Literal(String),
    /// A variable; unset reads as empty.
    Var {
        /// Where the variable lives.
        scope: VarScope,
        /// Full variable key.
        name: String,
    },
}

impl StrExpr {
    /// Evaluate against a live conversation.
    pub fn evaluate(&self, d: &Dialogue<'_>) -> String {
        match self {
            StrExpr::Literal(text) => text.clone(),
            StrExpr::Var { scope, name } => scope.read(d, name).unwrap_or_default(),
        }
    }
}

/// Read a variable that must hold a position. Unset falls back to `fallback`.
pub(crate) fn read_position(
    d: &Dialogue<'_>,
    scope: VarScope,
    name: &str,
    fallback: Tripoint,
) -> DialogueResult<Tripoint> {
    match scope.read(d, name) {
        Some(text) => text.parse().map_err(DialogueError::Core),
        None => Ok(fallback),
    }
}
