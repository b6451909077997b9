//! Native functions installed in the globals environment at startup.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use rand::Rng;

use crate::callable::NativeFunction;
use crate::environment::Environment;
use crate::value::Value;

/// Granularity of the `sleep` wait loop; cancellation is observed between
/// slices.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64, String> {
    match &args[index] {
        Value::Number(n) => Ok(*n),

        other => Err(format!(
            "{}() expects a number, got {}.",
            name,
            other.type_name()
        )),
    }
}

fn string_arg(name: &str, args: &[Value], index: usize) -> Result<String, String> {
    match &args[index] {
        Value::String(s) => Ok(s.clone()),

        other => Err(format!(
            "{}() expects a string, got {}.",
            name,
            other.type_name()
        )),
    }
}

/// Populate `globals` with every built-in function.
pub fn define_globals(globals: &mut Environment) {
    debug!("Defining native functions in globals");

    globals.define(
        "clock",
        Value::Native(NativeFunction::new(
            "clock",
            0,
            Box::new(|_, _| {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| format!("Clock error: {}", e))?;

                Ok(Value::Number(now.as_millis() as f64))
            }),
        )),
    );

    globals.define(
        "sleep",
        Value::Native(NativeFunction::new(
            "sleep",
            1,
            Box::new(|interpreter, args| {
                let ms = number_arg("sleep", args, 0)?;

                if ms < 0.0 {
                    return Err("sleep() expects a non-negative number.".to_string());
                }

                let deadline = Duration::from_millis(ms as u64);
                let mut slept = Duration::ZERO;

                // Wake early when the run is cancelled mid-wait.
                while slept < deadline {
                    if interpreter.cancel().is_cancelled() {
                        break;
                    }

                    let slice = SLEEP_SLICE.min(deadline - slept);

                    thread::sleep(slice);

                    slept += slice;
                }

                Ok(Value::Nil)
            }),
        )),
    );

    globals.define(
        "input",
        Value::Native(NativeFunction::new(
            "input",
            1,
            Box::new(|interpreter, args| {
                let prompt = string_arg("input", args, 0)?;

                let line = interpreter
                    .host()
                    .input(&prompt)
                    .map_err(|e| e.to_string())?;

                Ok(Value::String(line))
            }),
        )),
    );

    globals.define(
        "parseNumber",
        Value::Native(NativeFunction::new(
            "parseNumber",
            1,
            Box::new(|_, args| {
                let text = string_arg("parseNumber", args, 0)?;

                text.trim()
                    .parse::<f64>()
                    .map(Value::Number)
                    .map_err(|_| format!("Could not parse '{}' as a number.", text))
            }),
        )),
    );

    globals.define(
        "randInt",
        Value::Native(NativeFunction::new(
            "randInt",
            1,
            Box::new(|_, args| {
                let upper = number_arg("randInt", args, 0)?;

                if upper < 1.0 {
                    return Err("randInt() expects a positive number.".to_string());
                }

                let n: i64 = rand::thread_rng().gen_range(0..upper as i64);

                Ok(Value::Number(n as f64))
            }),
        )),
    );

    globals.define(
        "len",
        Value::Native(NativeFunction::new(
            "len",
            1,
            Box::new(|_, args| match &args[0] {
                Value::List(list) => Ok(Value::Number(list.borrow().len() as f64)),

                _ => Err("len() can only be called on iterables.".to_string()),
            }),
        )),
    );

    globals.define(
        "floor",
        Value::Native(NativeFunction::new(
            "floor",
            1,
            Box::new(|_, args| {
                let n = number_arg("floor", args, 0)?;

                Ok(Value::Number(n.floor()))
            }),
        )),
    );

    globals.define(
        "ord",
        Value::Native(NativeFunction::new(
            "ord",
            1,
            Box::new(|_, args| {
                let text = string_arg("ord", args, 0)?;

                match text.as_bytes().first() {
                    Some(byte) => Ok(Value::Number(*byte as f64)),

                    None => Err("ord() expects a non-empty string.".to_string()),
                }
            }),
        )),
    );

    globals.define(
        "clear",
        Value::Native(NativeFunction::new(
            "clear",
            0,
            Box::new(|interpreter, _| {
                // Form feed; terminal-aware hosts treat it as clear-screen.
                interpreter.host().print("\u{c}");

                Ok(Value::Nil)
            }),
        )),
    );

    globals.define(
        "print",
        Value::Native(NativeFunction::new(
            "print",
            1,
            Box::new(|interpreter, args| {
                interpreter.host().print(&args[0].to_string());

                Ok(Value::Nil)
            }),
        )),
    );
}
