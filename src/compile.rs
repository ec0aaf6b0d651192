//! Translates a configuration into the SCPI command sequence that applies it.
//!
//! Values are passed through as stored; checking them is the job of whoever edits the
//! configuration (see [`Configuration::issues`]).

use crate::{Channel, Configuration};

fn switch(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

/// Quote `text` as an IEEE 488.2 string literal; embedded quotes are doubled.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn compile_channel(commands: &mut Vec<String>, channel: &Channel) {
    let n = channel.number;
    commands.push(format!(":CHAN{}:DISP {}", n, switch(channel.display)));
    if !channel.display { return }

    if !channel.scale.is_empty() {
        commands.push(format!(":CHAN{}:SCAL {}", n, channel.scale));
    }
    if !channel.label.is_empty() {
        commands.push(format!(":CHAN{}:LAB {}", n, quote(&channel.label)));
    }
    if !channel.probe.is_empty() {
        commands.push(format!(":CHAN{}:PROB {}", n, channel.probe));
    }
    // `:CHAN<n>:UNIT` is not understood by every model in the family; the unit is kept in
    // the document only.
}

/// Compile `config` into commands, in the order they must be sent.
///
/// The display label switch comes first, then the timebase, then each channel in
/// `config.channels` order, then the trigger (whose source, level and slope live under the
/// `:TRIG:<mode>` subsystem), and finally the trigger command.
pub fn compile(config: &Configuration) -> Vec<String> {
    let mut commands = Vec::new();

    commands.push(format!("DISP:LAB {}", switch(config.display_label)));

    let time_scale = config.time_scale.trim();
    if !time_scale.is_empty() {
        commands.push(format!(":TIM:SCAL {}", time_scale));
    }

    for channel in config.channels.iter() {
        compile_channel(&mut commands, channel);
    }

    let trigger = &config.trigger;
    let mode = trigger.mode.as_str();
    commands.push(format!(":TRIG:MODE {}", mode));
    commands.push(format!(":TRIG:{}:SOUR {}", mode, trigger.source));
    if !trigger.level.is_empty() {
        commands.push(format!(":TRIG:{}:LEV {}", mode, trigger.level));
    }
    if !trigger.slope.as_str().is_empty() {
        commands.push(format!(":TRIG:{}:SLOP {}", mode, trigger.slope));
    }

    if !config.trigger_command.is_empty() {
        commands.push(config.trigger_command.clone());
    }

    for command in commands.iter() {
        log::trace!("compiled {:?}", command);
    }
    log::debug!("compiled {} command(s)", commands.len());
    commands
}
