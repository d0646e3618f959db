use super::globals::Action;
use serde::Serialize;
use std::io::Write;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
/// Cash that moved in or out of the acting player's balance during one step.
/// Outflows are stored as positive amounts.
pub struct Ledger {
    pub passed_go: i64,
    /// Net cash from the card drawn this step, including any pass-go credit it grants.
    pub card: i64,
    pub purchase: i64,
    pub houses: i64,
    /// Taxes and the jail fee.
    pub fees: i64,
    pub rent: i64,
    /// Proceeds of selling houses and squares back to the bank.
    pub liquidation: i64,
}

impl Ledger {
    /// The net change to the player's cash.
    pub fn total(&self) -> i64 {
        self.passed_go + self.card + self.liquidation
            - self.purchase
            - self.houses
            - self.fees
            - self.rent
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
/// Everything that happened during one call to `Env::step`.
pub struct StepTrace {
    pub episode_id: usize,
    pub step: usize,
    pub player: usize,
    pub position_before: usize,
    /// The sum of the movement dice, or 0 if the turn was spent in jail.
    pub dice_roll: usize,
    pub landed_on_position: usize,
    pub position_after: usize,
    pub money_before: i64,
    pub money_after: i64,
    pub reward: f64,
    pub terminal: bool,
    pub in_jail: bool,
    /// Taxes, the jail fee and rent paid.
    pub fee_paid: i64,
    pub action: Action,
    pub properties_owned: usize,
    pub card_drawn: String,
    pub card_description: String,
    pub summary: String,
    #[serde(skip)]
    pub ledger: Ledger,
}

/// A bounded buffer of step traces owned by one worker.
///
/// Once full, further traces are counted and dropped.
#[derive(Debug, Default)]
pub struct TraceLog {
    traces: Vec<StepTrace>,
    capacity: usize,
    dropped: usize,
}

impl TraceLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            traces: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Store a trace, or drop it if the buffer is full or can't grow.
    /// Return whether it was kept.
    pub fn push(&mut self, trace: StepTrace) -> bool {
        if self.traces.len() >= self.capacity || self.traces.try_reserve(1).is_err() {
            if self.dropped == 0 {
                log::warn!(
                    "trace buffer full in episode {}, dropping further traces",
                    trace.episode_id
                );
            }
            self.dropped += 1;
            return false;
        }
        self.traces.push(trace);
        true
    }

    pub fn traces(&self) -> &[StepTrace] {
        &self.traces
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

/// Column names of the trace CSV, in output order.
pub const CSV_HEADER: &str = "episode_id,step,player,position_before,dice_roll,\
landed_on_position,position_after,money_before,money_after,reward,done,in_jail,\
fee_paid,agent_action,num_owned_properties,card_drawn,card_specific_desc,action_desc";

/// Quote a CSV field, doubling any quotes inside it.
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl StepTrace {
    /// Write this trace as one CSV row.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{:.4},{},{},{},{},{},{},{},{}",
            self.episode_id,
            self.step,
            self.player,
            self.position_before,
            self.dice_roll,
            self.landed_on_position,
            self.position_after,
            self.money_before,
            self.money_after,
            self.reward,
            self.terminal as u8,
            self.in_jail as u8,
            self.fee_paid,
            self.action.index(),
            self.properties_owned,
            quoted(&self.card_drawn),
            quoted(&self.card_description),
            quoted(&self.summary),
        )
    }
}
