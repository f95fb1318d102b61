//! Command processing and the commit gate.
//!
//! Every recognized command runs against a copy of the ladder. The copy is
//! saved through the [`SnapshotSink`] and only then becomes the live state,
//! so a failed save leaves the previous state in place.

use time::Date;
use tracing::{debug, error, info};

use crate::config::LadderConfig;
use crate::core::{
    ClaimId, LadderError, LadderState, Outcome, PlayerId, RatingPolicy, Resolution,
};

use super::calendar::{Calendar, SystemCalendar};
use super::command::{self, Command, CommandKind, Parsed};
use super::snapshot::{SnapshotSink, SnapshotStore};

pub const COMMIT_FAILED: &str =
    "Internal error: ladder state could not be saved; command discarded.";
const UNKNOWN_COMMAND: &str = "Eh?";

/// One line of chat delivered to the ladder.
///
/// `channel` is where public replies go: the channel for channel
/// messages, the sender for private ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub sender: String,
    pub channel: String,
    pub text: String,
}

impl Inbound {
    pub fn new(
        sender: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            channel: channel.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Public line.
    Say { target: String, text: String },
    /// Private line to one user.
    Notice { target: String, text: String },
}

impl Reply {
    pub fn target(&self) -> &str {
        match self {
            Reply::Say { target, .. } | Reply::Notice { target, .. } => target,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Say { text, .. } | Reply::Notice { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderSettings {
    pub policy: RatingPolicy,
    pub prefix: String,
    pub top_count: usize,
}

impl Default for LadderSettings {
    fn default() -> Self {
        Self::from(&LadderConfig::default())
    }
}

impl From<&LadderConfig> for LadderSettings {
    fn from(config: &LadderConfig) -> Self {
        Self {
            policy: config.rating_policy(),
            prefix: config.command_prefix.clone(),
            top_count: config.top_count,
        }
    }
}

pub struct Processor<S = SnapshotStore, C = SystemCalendar> {
    state: LadderState,
    sink: S,
    calendar: C,
    settings: LadderSettings,
}

impl<S: SnapshotSink, C: Calendar> Processor<S, C> {
    pub fn new(state: LadderState, sink: S, calendar: C, settings: LadderSettings) -> Self {
        Self {
            state,
            sink,
            calendar,
            settings,
        }
    }

    pub fn state(&self) -> &LadderState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn settings(&self) -> &LadderSettings {
        &self.settings
    }

    /// Handles one line. Returns the replies to send, in order.
    pub fn handle(&mut self, msg: &Inbound) -> Vec<Reply> {
        let command = match command::parse(&msg.text, &self.settings.prefix) {
            Parsed::NotCommand => return Vec::new(),
            Parsed::Unknown(name) => {
                debug!(sender = %msg.sender, name, "unknown command");
                return vec![Reply::Say {
                    target: msg.channel.clone(),
                    text: UNKNOWN_COMMAND.to_string(),
                }];
            }
            Parsed::Known(command) => command,
        };
        let Some(sender) = PlayerId::new(msg.sender.as_str()) else {
            debug!(sender = ?msg.sender, "ignoring command from unusable sender");
            return Vec::new();
        };

        let span = tracing::info_span!("command", sender = %sender, command = %command.kind);
        let _guard = span.enter();
        debug!(args = ?command.args, "dispatch");

        let mut next = self.state.clone();
        let mut out = Outbox::new(msg);
        let ctx = Context {
            sender: &sender,
            today: self.calendar.today(),
            settings: &self.settings,
        };
        if let Err(err) = dispatch(&mut next, &ctx, &command, &mut out) {
            debug!(code = err.code(), "refused: {err}");
            out.say(err.to_string());
        }

        match self.sink.save(&next) {
            Ok(()) => {
                self.state = next;
                out.replies
            }
            Err(err) => {
                error!(
                    error = %err,
                    transience = ?err.transience(),
                    "commit failed; command discarded"
                );
                vec![Reply::Say {
                    target: msg.channel.clone(),
                    text: COMMIT_FAILED.to_string(),
                }]
            }
        }
    }
}

struct Context<'a> {
    sender: &'a PlayerId,
    today: Date,
    settings: &'a LadderSettings,
}

struct Outbox<'a> {
    channel: &'a str,
    sender: &'a str,
    replies: Vec<Reply>,
}

impl<'a> Outbox<'a> {
    fn new(msg: &'a Inbound) -> Self {
        Self {
            channel: &msg.channel,
            sender: &msg.sender,
            replies: Vec::new(),
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::Say {
            target: self.channel.to_string(),
            text: text.into(),
        });
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.replies.push(Reply::Notice {
            target: self.sender.to_string(),
            text: text.into(),
        });
    }
}

fn dispatch(
    state: &mut LadderState,
    ctx: &Context<'_>,
    command: &Command<'_>,
    out: &mut Outbox<'_>,
) -> Result<(), LadderError> {
    let me = ctx.sender;
    if command.kind.needs_registration() {
        state.player(me.as_str())?;
    }

    match command.kind {
        CommandKind::Register => {
            let rating = state
                .register(me.clone(), ctx.today, ctx.settings.policy)?
                .rating();
            info!(rating, "player registered");
            out.say(format!(
                "Thanks for registering, {me}. Your initial rating is {rating}."
            ));
        }
        CommandKind::Win => report(state, ctx, &command.args, Outcome::Win, out)?,
        CommandKind::Loss => report(state, ctx, &command.args, Outcome::Loss, out)?,
        CommandKind::Draw => report(state, ctx, &command.args, Outcome::Draw, out)?,
        CommandKind::Verify => {
            let id = claim_id_arg(&command.args)?;
            match state.verify(me.as_str(), id, ctx.settings.policy)? {
                Resolution::Draw { claim } => {
                    info!(claim = %claim.id, "draw verified");
                    out.say("No rating change.");
                }
                Resolution::Decisive {
                    claim,
                    winner,
                    winner_rating,
                    loser,
                    loser_rating,
                    change,
                } => {
                    info!(
                        claim = %claim.id,
                        %winner,
                        %loser,
                        winner_delta = change.winner_delta,
                        loser_delta = change.loser_delta,
                        "result verified"
                    );
                    out.say(format!(
                        "Ratings updated. {winner} now on {winner_rating} (+{}). {loser} now on {loser_rating} ({})",
                        change.winner_delta, change.loser_delta
                    ));
                }
            }
        }
        CommandKind::Reject => {
            let id = claim_id_arg(&command.args)?;
            let claim = state.reject(me.as_str(), id)?;
            info!(claim = %claim.id, claimant = %claim.claimant, "claim rejected");
            out.say("Rejected claim.");
        }
        CommandKind::Cancel => {
            let id = claim_id_arg(&command.args)?;
            let claim = state.cancel(me.as_str(), id)?;
            info!(claim = %claim.id, "claim cancelled");
            out.say("Claim removed.");
        }
        CommandKind::Incoming => {
            out.notice("incoming claims:");
            for claim in state.incoming(me.as_str()) {
                out.notice(claim.to_string());
            }
        }
        CommandKind::Outgoing => {
            out.notice("outgoing claims:");
            for claim in state.outgoing(me.as_str()) {
                out.notice(claim.to_string());
            }
        }
        CommandKind::Top => {
            for line in standings_lines(state, ctx.settings.top_count) {
                out.notice(line);
            }
        }
        CommandKind::Help => {
            out.say("Supported commands:");
            let listing: Vec<String> = CommandKind::ALL
                .iter()
                .map(|kind| format!("{}{kind}", ctx.settings.prefix))
                .collect();
            out.say(format!("  {}", listing.join(" ")));
        }
    }
    Ok(())
}

/// `win|loss|draw vs <opponent>`, from the sender's side.
fn report(
    state: &mut LadderState,
    ctx: &Context<'_>,
    args: &[&str],
    outcome: Outcome,
    out: &mut Outbox<'_>,
) -> Result<(), LadderError> {
    state.ensure_can_file(ctx.sender.as_str())?;
    let ["vs", opponent] = args else {
        return Err(LadderError::InvalidOutcomeArgs { outcome });
    };
    let claim = state.file_claim(ctx.sender, opponent, outcome, ctx.today)?;
    info!(claim = %claim.id, respondent = %claim.respondent, %outcome, "claim filed");
    out.say(format!(
        "Added unverified claim {}; ratings will be adjusted when the other party verifies it",
        claim.id
    ));
    Ok(())
}

/// `#<rank>: <name> (<rating>)` for the best `count` players.
pub fn standings_lines(state: &LadderState, count: usize) -> Vec<String> {
    state
        .standings(count)
        .iter()
        .enumerate()
        .map(|(rank, (name, player))| format!("#{}: {name} ({})", rank + 1, player.rating()))
        .collect()
}

fn claim_id_arg(args: &[&str]) -> Result<ClaimId, LadderError> {
    match args {
        [raw] => raw.parse(),
        _ => Err(LadderError::InvalidId {
            raw: args.join(" "),
        }),
    }
}
