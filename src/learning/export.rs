use super::key::StateKey;
use super::table::ActionStats;
use crate::game::Action;
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug, PartialEq, Serialize)]
/// One learned state-action value, flattened for output.
pub struct ValueRecord {
    pub position: usize,
    pub money_bin: i64,
    pub owner: i32,
    pub in_jail: bool,
    pub action: Action,
    pub mean: f64,
    pub count: u64,
}

impl ValueRecord {
    pub fn new(key: &StateKey, action: Action, stats: &ActionStats) -> ValueRecord {
        ValueRecord {
            position: key.position,
            money_bin: key.money_bin,
            owner: key.owner,
            in_jail: key.in_jail,
            action,
            mean: stats.mean,
            count: stats.count,
        }
    }

    pub fn key(&self) -> StateKey {
        StateKey {
            position: self.position,
            money_bin: self.money_bin,
            owner: self.owner,
            in_jail: self.in_jail,
        }
    }
}

/// Write value records as CSV with a header row.
pub fn write_csv<W: Write>(records: &[ValueRecord], mut out: W) -> std::io::Result<()> {
    writeln!(out, "position,money_bin,current_prop_owner,in_jail,action,q_value,count")?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{:.6},{}",
            r.position,
            r.money_bin,
            r.owner,
            r.in_jail as u8,
            r.action.index(),
            r.mean,
            r.count
        )?;
    }
    Ok(())
}

/// Write value records as a JSON array.
pub fn write_json<W: Write>(records: &[ValueRecord], out: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, records)
}
