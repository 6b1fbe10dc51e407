//! Integer, duration and string expressions.

use serde_json::Value;

use pv_core::vars::talk_varname;
use pv_core::world::WeatherField;
use pv_core::{Role, Stat, TimeDuration};
use pv_dialogue::expr::{ArithOp, Assignment, DurationExpr, IntExpr, IntTarget, StrExpr, VarScope};

use crate::locate::KeyPath;
use crate::reader::{Cx, Obj, array};

const INT_FORMS: &[&str] = &[
    "const",
    "time",
    "time_since_cataclysm",
    "rand",
    "weather",
    "u_val",
    "npc_val",
    "global_val",
    "arithmetic",
];

const VALUE_KINDS: &[&str] = &["var", "time_since_var", "skill_level", "item_count"];

const ARITH_SYMBOLS: &[&str] = &["+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>"];

const WEATHER_FIELDS: &[&str] = &["temperature", "windpower", "humidity", "pressure"];

/// The full variable key named by `obj[member]` plus its `type` and `context`.
pub(crate) fn var_name(cx: &mut Cx<'_>, obj: &Obj<'_>, member: &str) -> Option<String> {
    let name = obj.req_str(cx, member);
    let var_type = obj.str_or(cx, "type", "");
    let context = obj.str_or(cx, "context", "");
    Some(talk_varname(name?, &var_type, &context))
}

/// An integer literal or expression object.
pub(crate) fn int_expr(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<IntExpr> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(n) => Some(IntExpr::Const(n)),
            None => {
                cx.error(path, "expected an integer");
                None
            }
        },
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            let form = expression_form(cx, &obj, "integer expression")?;
            match form {
                "const" => obj.int(cx, form).map(IntExpr::Const),
                "time" => {
                    let text = obj.str(cx, form)?;
                    duration_text(cx, text, &obj.at(form)).map(|d| IntExpr::Const(d.turns()))
                }
                "time_since_cataclysm" => {
                    time_unit(cx, &obj).map(|unit| IntExpr::TimeSinceCataclysm { unit })
                }
                "rand" => obj.int(cx, form).map(IntExpr::Rand),
                "weather" => weather_field(cx, &obj).map(IntExpr::Weather),
                "arithmetic" => arithmetic(cx, &obj),
                _ => value_expr(cx, &obj, form),
            }
        }
        _ => {
            cx.error(path, "expected an integer or an integer expression");
            None
        }
    }
}

/// A mandatory integer member.
pub(crate) fn req_int(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<IntExpr> {
    match obj.get(key) {
        Some(value) => int_expr(cx, value, &obj.at(key)),
        None => {
            obj.missing(cx, key);
            None
        }
    }
}

/// An optional integer member with a default.
pub(crate) fn int_or(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str, default: i64) -> IntExpr {
    match obj.get(key) {
        Some(value) => int_expr(cx, value, &obj.at(key)).unwrap_or(IntExpr::Const(default)),
        None => IntExpr::Const(default),
    }
}

/// A writable integer destination.
pub(crate) fn int_target(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<IntTarget> {
    let obj = Obj::new(cx, value, path.clone())?;
    let form = expression_form(cx, &obj, "assignment target")?;
    let at = obj.at(form);
    match form {
        "const" | "time" | "rand" | "arithmetic" => {
            cx.error(&at, format!("`{form}` cannot be assigned to"));
            None
        }
        "time_since_cataclysm" => time_unit(cx, &obj).map(|unit| IntTarget::Clock { unit }),
        "weather" => weather_field(cx, &obj).map(IntTarget::Weather),
        _ => value_target(cx, &obj, form),
    }
}

/// A duration string, a bare number of turns, or an integer expression.
pub(crate) fn duration(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<DurationExpr> {
    match value {
        Value::String(text) => duration_text(cx, text, path).map(DurationExpr::Fixed),
        Value::Number(_) | Value::Object(_) => int_expr(cx, value, path).map(|expr| match expr {
            IntExpr::Const(n) => DurationExpr::Fixed(TimeDuration::from_turns(n)),
            expr => DurationExpr::Turns(expr),
        }),
        _ => {
            cx.error(path, "expected a duration");
            None
        }
    }
}

pub(crate) fn req_duration(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<DurationExpr> {
    match obj.get(key) {
        Some(value) => duration(cx, value, &obj.at(key)),
        None => {
            obj.missing(cx, key);
            None
        }
    }
}

pub(crate) fn duration_or(
    cx: &mut Cx<'_>,
    obj: &Obj<'_>,
    key: &str,
    default: TimeDuration,
) -> DurationExpr {
    obj.get(key)
        .and_then(|value| duration(cx, value, &obj.at(key)))
        .unwrap_or(DurationExpr::Fixed(default))
}

/// A fixed duration written as text or as a number of turns.
pub(crate) fn fixed_duration(
    cx: &mut Cx<'_>,
    value: &Value,
    path: &KeyPath,
) -> Option<TimeDuration> {
    match value {
        Value::String(text) => duration_text(cx, text, path),
        Value::Number(n) => match n.as_i64() {
            Some(n) => Some(TimeDuration::from_turns(n)),
            None => {
                cx.error(path, "expected a whole number of turns");
                None
            }
        },
        _ => {
            cx.error(path, "expected a duration such as \"2 h\"");
            None
        }
    }
}

fn duration_text(cx: &mut Cx<'_>, text: &str, path: &KeyPath) -> Option<TimeDuration> {
    match TimeDuration::parse(text) {
        Ok(duration) => Some(duration),
        Err(err) => {
            cx.error(path, err.to_string());
            None
        }
    }
}

/// A string literal or a `u_val`/`npc_val`/`global_val` variable.
pub(crate) fn str_expr(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<StrExpr> {
    match value {
        Value::String(s) => Some(StrExpr::Literal(s.clone())),
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            let Some(form) = obj.first_of(&["u_val", "npc_val", "global_val"]) else {
                cx.error(path, "expected `u_val`, `npc_val` or `global_val`");
                return None;
            };
            let name = var_name(cx, &obj, form)?;
            Some(StrExpr::Var {
                scope: scope_of(form),
                name,
            })
        }
        _ => {
            cx.error(path, "expected a string or a variable");
            None
        }
    }
}

/// An `arithmetic` effect: `[target, "=", a, op, b]`, `[target, "=", a, "~"]`,
/// `[target, "=" | "+=" | ..., b]` or `[target, "++" | "--"]`.
pub(crate) fn assignment(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Assignment> {
    let items = array(cx, value, path)?;
    match items.len() {
        5 => {
            let target = int_target(cx, items[0].0, &items[0].1);
            let assign = expect_symbol(cx, &items[1], "=");
            let lhs = int_expr(cx, items[2].0, &items[2].1);
            let op = arith_op(cx, &items[3]);
            let rhs = int_expr(cx, items[4].0, &items[4].1);
            assign?;
            Some(Assignment::new(target?, IntExpr::binary(op?, lhs?, rhs?)))
        }
        4 => {
            let target = int_target(cx, items[0].0, &items[0].1);
            let assign = expect_symbol(cx, &items[1], "=");
            let operand = int_expr(cx, items[2].0, &items[2].1);
            let not = expect_symbol(cx, &items[3], "~");
            assign?;
            not?;
            Some(Assignment::new(target?, IntExpr::BitNot(Box::new(operand?))))
        }
        3 => {
            let target = int_target(cx, items[0].0, &items[0].1);
            let rhs = int_expr(cx, items[2].0, &items[2].1);
            let (symbol, at) = &items[1];
            match symbol.as_str() {
                Some("=") => Some(Assignment::new(target?, rhs?)),
                Some(s) => match ArithOp::from_compound(s) {
                    Some(op) => Some(Assignment::compound(target?, op, rhs?)),
                    None => {
                        let known = ["=", "+=", "-=", "*=", "/=", "%="];
                        cx.unknown(at, "assignment operator", s, known);
                        None
                    }
                },
                None => {
                    cx.error(at, "expected an assignment operator");
                    None
                }
            }
        }
        2 => {
            let target = int_target(cx, items[0].0, &items[0].1);
            let (symbol, at) = &items[1];
            let delta = match symbol.as_str() {
                Some("++") => 1,
                Some("--") => -1,
                _ => {
                    cx.error(at, "expected `++` or `--`");
                    return None;
                }
            };
            Some(Assignment::step(target?, delta))
        }
        n => {
            cx.error(path, format!("`arithmetic` takes 2 to 5 elements, found {n}"));
            None
        }
    }
}

fn expression_form(cx: &mut Cx<'_>, obj: &Obj<'_>, what: &str) -> Option<&'static str> {
    if let Some(form) = obj.first_of(INT_FORMS) {
        return Some(form);
    }
    match obj.map.keys().next() {
        Some(first) => cx.unknown(&obj.at(first), what, first, INT_FORMS.iter().copied()),
        None => cx.error(&obj.path, format!("empty {what}")),
    }
    None
}

fn scope_of(form: &str) -> VarScope {
    match form {
        "u_val" => VarScope::Actor(Role::Alpha),
        "npc_val" => VarScope::Actor(Role::Beta),
        _ => VarScope::Global,
    }
}

/// The speaker a `u_val`/`npc_val` form reads from; `global_val` has none.
fn actor(cx: &mut Cx<'_>, obj: &Obj<'_>, form: &str, kind: &str) -> Option<Role> {
    match scope_of(form) {
        VarScope::Actor(role) => Some(role),
        VarScope::Global => {
            cx.error(&obj.at(form), format!("`global_val` supports only `var`, not `{kind}`"));
            None
        }
    }
}

fn value_expr(cx: &mut Cx<'_>, obj: &Obj<'_>, form: &str) -> Option<IntExpr> {
    let kind = obj.req_str(cx, form)?;
    match kind {
        "var" => {
            let name = var_name(cx, obj, "var_name")?;
            let default = obj.int_or(cx, "default", 0);
            Some(IntExpr::Var {
                scope: scope_of(form),
                name,
                default,
            })
        }
        "time_since_var" => {
            let role = actor(cx, obj, form, kind);
            let name = var_name(cx, obj, "var_name");
            Some(IntExpr::TimeSinceVar {
                role: role?,
                name: name?,
            })
        }
        "skill_level" => {
            let role = actor(cx, obj, form, kind);
            let skill = obj.req_str(cx, "skill");
            Some(IntExpr::SkillLevel {
                role: role?,
                skill: skill?.to_string(),
            })
        }
        "item_count" => {
            let role = actor(cx, obj, form, kind);
            let item = obj.req_str(cx, "item");
            Some(IntExpr::ItemCount {
                role: role?,
                item: item?.to_string(),
            })
        }
        name => {
            let role = actor(cx, obj, form, name)?;
            match Stat::from_name(name) {
                Ok(stat) => Some(IntExpr::Stat { role, stat }),
                Err(_) => {
                    let known = Stat::names().chain(VALUE_KINDS.iter().copied());
                    cx.unknown(&obj.at(form), "value", name, known);
                    None
                }
            }
        }
    }
}

fn value_target(cx: &mut Cx<'_>, obj: &Obj<'_>, form: &str) -> Option<IntTarget> {
    let kind = obj.req_str(cx, form)?;
    let at = obj.at(form);
    match kind {
        "var" => {
            let name = var_name(cx, obj, "var_name")?;
            Some(IntTarget::Var {
                scope: scope_of(form),
                name,
            })
        }
        "time_since_var" => {
            let role = actor(cx, obj, form, kind);
            let name = var_name(cx, obj, "var_name");
            Some(IntTarget::TimeSinceVar {
                role: role?,
                name: name?,
            })
        }
        "skill_level" => {
            let role = actor(cx, obj, form, kind);
            let skill = obj.req_str(cx, "skill");
            Some(IntTarget::SkillLevel {
                role: role?,
                skill: skill?.to_string(),
            })
        }
        "item_count" => {
            cx.error(&at, "`item_count` cannot be assigned to");
            None
        }
        name => {
            let role = actor(cx, obj, form, name)?;
            let stat = match Stat::from_name(name) {
                Ok(stat) => stat,
                Err(_) => {
                    let known = Stat::names().chain(VALUE_KINDS.iter().copied());
                    cx.unknown(&at, "value", name, known);
                    return None;
                }
            };
            if !stat.is_writable() {
                cx.error(&at, format!("`{name}` cannot be assigned to"));
                return None;
            }
            if role == Role::Beta && matches!(stat, Stat::Owed | Stat::Sold) {
                cx.error(&at, format!("`{name}` is only tracked on the `u_` side"));
                return None;
            }
            Some(IntTarget::Stat { role, stat })
        }
    }
}

fn time_unit(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<i64> {
    let key = "time_since_cataclysm";
    match obj.get(key) {
        Some(Value::String(unit)) => match TimeDuration::unit_turns(unit) {
            Some(turns) => Some(turns),
            None => {
                let known = ["turns", "minutes", "hours", "days", "weeks"];
                cx.unknown(&obj.at(key), "time unit", unit, known);
                None
            }
        },
        _ => Some(1),
    }
}

fn weather_field(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<WeatherField> {
    let name = obj.str(cx, "weather")?;
    match WeatherField::from_name(name) {
        Some(field) => Some(field),
        None => {
            cx.unknown(&obj.at("weather"), "weather field", name, WEATHER_FIELDS.iter().copied());
            None
        }
    }
}

fn arithmetic(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<IntExpr> {
    let path = obj.at("arithmetic");
    let items = array(cx, obj.get("arithmetic")?, &path)?;
    match items.as_slice() {
        [a, op, b] => {
            let lhs = int_expr(cx, a.0, &a.1);
            let op = arith_op(cx, op);
            let rhs = int_expr(cx, b.0, &b.1);
            Some(IntExpr::binary(op?, lhs?, rhs?))
        }
        [a, not] if not.0.as_str() == Some("~") => {
            int_expr(cx, a.0, &a.1).map(|e| IntExpr::BitNot(Box::new(e)))
        }
        _ => {
            cx.error(&path, "expected `[a, op, b]` or `[a, \"~\"]`");
            None
        }
    }
}

fn arith_op(cx: &mut Cx<'_>, (value, path): &(&Value, KeyPath)) -> Option<ArithOp> {
    let Some(symbol) = value.as_str() else {
        cx.error(path, "expected an operator");
        return None;
    };
    let op = ArithOp::from_symbol(symbol);
    if op.is_none() {
        cx.unknown(path, "operator", symbol, ARITH_SYMBOLS.iter().copied());
    }
    op
}

fn expect_symbol(cx: &mut Cx<'_>, (value, path): &(&Value, KeyPath), symbol: &str) -> Option<()> {
    if value.as_str() == Some(symbol) {
        Some(())
    } else {
        cx.error(path, format!("expected `{symbol}`"));
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::locate::SpanIndex;

    use super::*;

    fn with_cx<T>(f: impl FnOnce(&mut Cx<'_>) -> T) -> (T, Vec<String>) {
        let spans = SpanIndex::default();
        let mut cx = Cx::new(&spans);
        let out = f(&mut cx);
        let messages = cx.diagnostics.iter().map(|d| d.message.clone()).collect();
        (out, messages)
    }

    #[test]
    fn literals_and_values() {
        let (expr, errors) = with_cx(|cx| int_expr(cx, &json!(7), &KeyPath::root()));
        assert_eq!(expr, Some(IntExpr::Const(7)));
        assert!(errors.is_empty());

        let value = json!({ "u_val": "strength_base" });
        let (expr, _) = with_cx(|cx| int_expr(cx, &value, &KeyPath::root()));
        assert_eq!(
            expr,
            Some(IntExpr::Stat {
                role: Role::Alpha,
                stat: Stat::StrengthBase
            })
        );

        let value = json!({ "npc_val": "var", "var_name": "met", "type": "dialogue", "default": 3 });
        let (expr, _) = with_cx(|cx| int_expr(cx, &value, &KeyPath::root()));
        assert_eq!(
            expr,
            Some(IntExpr::Var {
                scope: VarScope::Actor(Role::Beta),
                name: talk_varname("met", "dialogue", ""),
                default: 3,
            })
        );
    }

    #[test]
    fn time_constants_are_turns() {
        let value = json!({ "time": "2 h" });
        let (expr, _) = with_cx(|cx| int_expr(cx, &value, &KeyPath::root()));
        assert_eq!(expr, Some(IntExpr::Const(7200)));
    }

    #[test]
    fn unknown_values_are_suggested() {
        let value = json!({ "u_val": "strength_bsae" });
        let (expr, errors) = with_cx(|cx| int_expr(cx, &value, &KeyPath::root()));
        assert_eq!(expr, None);
        assert_eq!(errors, vec!["unknown value `strength_bsae`".to_string()]);
    }

    #[test]
    fn read_only_stats_cannot_be_targets() {
        let value = json!({ "u_val": "cash" });
        let (target, errors) = with_cx(|cx| int_target(cx, &value, &KeyPath::root()));
        assert_eq!(target, None);
        assert_eq!(errors, vec!["`cash` cannot be assigned to".to_string()]);

        let value = json!({ "npc_val": "owed" });
        let (target, _) = with_cx(|cx| int_target(cx, &value, &KeyPath::root()));
        assert_eq!(target, None);
    }

    #[test]
    fn assignments_of_every_arity() {
        let var = json!({ "global_val": "var", "var_name": "n" });
        let target = IntTarget::Var {
            scope: VarScope::Global,
            name: talk_varname("n", "", ""),
        };

        let five = json!([var, "=", 2, "*", 3]);
        let (a, _) = with_cx(|cx| assignment(cx, &five, &KeyPath::root()));
        let expected = Assignment::new(
            target.clone(),
            IntExpr::binary(ArithOp::Mul, IntExpr::Const(2), IntExpr::Const(3)),
        );
        assert_eq!(a, Some(expected));

        let three = json!([var, "+=", 4]);
        let (a, _) = with_cx(|cx| assignment(cx, &three, &KeyPath::root()));
        assert_eq!(
            a,
            Some(Assignment::compound(target.clone(), ArithOp::Add, IntExpr::Const(4)))
        );

        let two = json!([var, "--"]);
        let (a, _) = with_cx(|cx| assignment(cx, &two, &KeyPath::root()));
        assert_eq!(a, Some(Assignment::step(target, -1)));
    }

    #[test]
    fn bad_arithmetic_is_reported() {
        let var = json!({ "global_val": "var", "var_name": "n" });
        let (a, errors) = with_cx(|cx| assignment(cx, &json!([var, "=", 1, "+", 2, 3]), &KeyPath::root()));
        assert_eq!(a, None);
        assert_eq!(errors, vec!["`arithmetic` takes 2 to 5 elements, found 6".to_string()]);

        let (a, errors) = with_cx(|cx| assignment(cx, &json!([var, "+", 1, "~"]), &KeyPath::root()));
        assert_eq!(a, None);
        assert_eq!(errors, vec!["expected `=`".to_string()]);
    }

    #[test]
    fn durations_accept_text_and_turns() {
        let (d, _) = with_cx(|cx| duration(cx, &json!("PERMANENT"), &KeyPath::root()));
        assert_eq!(d, Some(DurationExpr::Fixed(TimeDuration::PERMANENT)));
        let (d, _) = with_cx(|cx| duration(cx, &json!(30), &KeyPath::root()));
        assert_eq!(d, Some(DurationExpr::Fixed(TimeDuration::from_turns(30))));
        let (d, errors) = with_cx(|cx| duration(cx, &json!("soon"), &KeyPath::root()));
        assert_eq!(d, None);
        assert_eq!(errors.len(), 1);
    }
}
