//! Play resolution: runs the contests for a called category and produces a
//! single [`PlayOutcome`] with its stat credits.
//!
//! Every random draw comes from the stream handed in by the caller, so the
//! same context and stream state always yields the same outcome.
use rand::Rng;
use smallvec::SmallVec;

use crate::adaptation::AdaptationTracker;
use crate::composure::Volatility;
use crate::config::{AdaptationConfig, OfficiatingConfig};
use crate::constants::{
    BLITZ_COVERAGE_COST, BLOCK_BASE, BLOCKED_KICK_DEFENSE_RECOVERY, BLOCKED_KICK_LOSS,
    BREAKAWAY_COUNTER, BREAKAWAY_DEEP_PASS, BREAKAWAY_DIVE, BREAKAWAY_EXTRA, BREAKAWAY_LATERAL,
    BREAKAWAY_MIN_GAIN, BREAKAWAY_POWER, BREAKAWAY_SHORT_PASS, BREAKAWAY_SWEEP, COUNTER_GAIN,
    DEEP_COMPLETION_BASE, DEEP_INTERCEPTION_BASE, DEEP_PASS_DEPTH, DEEP_PASS_GAIN, DIVE_GAIN,
    EDGE_PROBABILITY_SCALE, EDGE_YARD_SCALE, END_ZONE_RETURN_FAILURE, FIELD_LENGTH,
    FUMBLE_BASE, FUMBLE_RECOVERY_BY_OFFENSE, HEAVY_BLOCKING_BONUS, HOLDING_YARDS,
    KICK_SETBACK_YARDS, KNEEL_LOSS, LATERAL_FAILURE_BASE, LATERAL_FAILURE_LOSS, LATERAL_GAIN,
    LATERAL_INTERCEPTION_SHARE, OFFSIDE_YARDS, POWER_GAIN, PUNT_BASE_DISTANCE,
    PUNT_DISTANCE_PER_POWER, PUNT_SPREAD, PUNT_TOUCHBACK_DEPTH, RECEIVER_RANK_WEIGHTS,
    RETURN_BREAKAWAY, RETURN_GAIN, SACK_BASE, SACK_BLITZ_BONUS, SACK_LOSS, SHORT_COMPLETION_BASE,
    SHORT_INTERCEPTION_BASE, SHORT_PASS_DEPTH, SHORT_PASS_GAIN, SPREAD_SKILL_BONUS, SWEEP_GAIN,
};
use crate::contest::{self, Contest, ContestKind, Contestant, kick_make_probability};
use crate::identity::{DefensiveIdentity, OffensiveIdentity, defense_keys, offense_keys};
use crate::ledger::{Credit, StatKind};
use crate::numbers::{clamp_probability, round_yards};
use crate::play::{
    Actors, DefensiveCall, Formation, InterceptionKind, KickKind, OutcomeKind, Penalty,
    PenaltyKind, PlayCategory, PlayFamily, PlayOutcome, PuntResult,
};
use crate::rng::{pick_weighted, roll_chance, triangular};
use crate::roster::{Participant, PlayerId, Squad, UnitRatings};
use crate::state::TeamSide;
use crate::weather::WeatherEffect;

/// One team as seen by the resolver for a single snap.
#[derive(Debug, Clone, Copy)]
pub struct SideContext<'a> {
    pub team: TeamSide,
    pub squad: &'a Squad<'a>,
    pub volatility: Volatility,
    /// 1.0 when rested, down to 1 minus the fatigue cap.
    pub freshness: f64,
}

impl SideContext<'_> {
    fn contestant(&self, ratings: UnitRatings) -> Contestant {
        Contestant::new(ratings)
            .with_volatility(self.volatility)
            .with_freshness(self.freshness)
    }

    fn player(&self, participant: &Participant) -> Contestant {
        self.contestant(UnitRatings::from(&participant.ratings))
    }
}

/// Everything needed to resolve one snap.
#[derive(Debug, Clone, Copy)]
pub struct PlayContext<'a> {
    pub offense: SideContext<'a>,
    pub defense: SideContext<'a>,
    pub offense_identity: &'a OffensiveIdentity,
    pub defense_identity: &'a DefensiveIdentity,
    /// Line of scrimmage, from the offense's goal line.
    pub spot: i32,
    pub category: PlayCategory,
    pub formation: Formation,
    pub call: DefensiveCall,
    pub weather: WeatherEffect,
    /// The defending team's adaptation tracker.
    pub adaptation: &'a AdaptationTracker,
    pub adaptation_config: &'a AdaptationConfig,
}

struct Builder {
    offense: TeamSide,
    credits: SmallVec<[Credit; 8]>,
}

impl Builder {
    fn new(offense: TeamSide) -> Self {
        Self {
            offense,
            credits: SmallVec::new(),
        }
    }

    fn off(&mut self, player: PlayerId, kind: StatKind, value: i64) {
        self.credits
            .push(Credit::new(self.offense, player, kind, value));
    }

    fn def(&mut self, player: PlayerId, kind: StatKind, value: i64) {
        self.credits
            .push(Credit::new(self.offense.opponent(), player, kind, value));
    }

    /// Scrimmage credits for a completed run, lateral or kick-pass.
    fn scrimmage(&mut self, family: PlayFamily, actors: Actors, yards: i32) {
        let y = i64::from(yards);
        match family {
            PlayFamily::Run => {
                if let Some(carrier) = actors.primary {
                    self.off(carrier, StatKind::RushAttempts, 1);
                    self.off(carrier, StatKind::RushYards, y);
                }
            }
            PlayFamily::Lateral => {
                if let Some(initiator) = actors.primary {
                    self.off(initiator, StatKind::LateralChains, 1);
                    self.off(initiator, StatKind::LateralYards, y);
                }
            }
            PlayFamily::KickPass => {
                if let Some(passer) = actors.primary {
                    self.off(passer, StatKind::KickPassAttempts, 1);
                    self.off(passer, StatKind::KickPassCompletions, 1);
                    self.off(passer, StatKind::KickPassYards, y);
                }
                if let Some(receiver) = actors.secondary {
                    self.off(receiver, StatKind::Receptions, 1);
                    self.off(receiver, StatKind::ReceivingYards, y);
                }
            }
            PlayFamily::Kicking | PlayFamily::Clock => {}
        }
    }

    fn finish(self, category: PlayCategory, yards: i32, kind: OutcomeKind, actors: Actors) -> PlayOutcome {
        PlayOutcome {
            offense: self.offense,
            category,
            yards,
            kind,
            actors,
            penalty: None,
            credits: self.credits,
        }
    }
}

/// The player who ends up with the ball on a scrimmage play.
const fn ball_carrier(family: PlayFamily, actors: Actors) -> Option<PlayerId> {
    match family {
        PlayFamily::KickPass => actors.secondary,
        _ => actors.primary,
    }
}

fn pick_participant<'p, R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[&'p Participant],
    weight: impl Fn(&Participant) -> f64,
    fallback: &'p Participant,
) -> &'p Participant {
    let weighted: Vec<(&'p Participant, f64)> = pool.iter().map(|p| (*p, weight(p))).collect();
    pick_weighted(rng, &weighted).copied().unwrap_or(fallback)
}

fn gain<R: Rng + ?Sized>(rng: &mut R, (mean, spread): (f64, f64), edge: f64) -> f64 {
    spread.mul_add(triangular(rng), edge.mul_add(EDGE_YARD_SCALE, mean))
}

/// Roll for an explosive extension of a positive gain.
fn breakaway<R: Rng + ?Sized>(rng: &mut R, yards: i32, chance: f64) -> i32 {
    if yards < BREAKAWAY_MIN_GAIN || !roll_chance(rng, chance) {
        return yards;
    }
    let extra = round_yards(gain(rng, BREAKAWAY_EXTRA, 0.0)).max(1);
    yards + extra
}

const fn breakaway_chance(category: PlayCategory) -> f64 {
    match category {
        PlayCategory::Dive => BREAKAWAY_DIVE,
        PlayCategory::Power => BREAKAWAY_POWER,
        PlayCategory::Sweep => BREAKAWAY_SWEEP,
        PlayCategory::Counter => BREAKAWAY_COUNTER,
        PlayCategory::LateralChain => BREAKAWAY_LATERAL,
        PlayCategory::ShortKickPass => BREAKAWAY_SHORT_PASS,
        PlayCategory::DeepKickPass => BREAKAWAY_DEEP_PASS,
        _ => 0.0,
    }
}

/// Resolve the called play. Penalties are assessed separately.
pub fn resolve_play<R: Rng + ?Sized>(ctx: &PlayContext<'_>, rng: &mut R) -> PlayOutcome {
    match ctx.category.family() {
        PlayFamily::Run => resolve_run(ctx, rng),
        PlayFamily::Lateral => resolve_lateral(ctx, rng),
        PlayFamily::KickPass => resolve_kick_pass(ctx, rng),
        PlayFamily::Kicking => match KickKind::from_category(ctx.category) {
            Some(KickKind::Punt) | None => resolve_punt(ctx, rng),
            Some(kick) => resolve_scoring_kick(ctx, kick, rng),
        },
        PlayFamily::Clock => resolve_kneel(ctx),
    }
}

/// Shared tail of every scrimmage play: suppression, goal-line clamps and
/// the fumble check, then credits.
fn finish_scrimmage<R: Rng + ?Sized>(
    ctx: &PlayContext<'_>,
    rng: &mut R,
    actors: Actors,
    raw_yards: i32,
    breakaway_bonus: f64,
) -> PlayOutcome {
    let family = ctx.category.family();
    let mut yards = breakaway(
        rng,
        raw_yards,
        breakaway_chance(ctx.category) + breakaway_bonus,
    );
    yards = ctx
        .adaptation
        .suppress_yards(ctx.category, yards, ctx.adaptation_config);

    let mut b = Builder::new(ctx.offense.team);
    let end = ctx.spot + yards;
    if end >= FIELD_LENGTH {
        let yards = FIELD_LENGTH - ctx.spot;
        b.scrimmage(family, actors, yards);
        if let Some(scorer) = ball_carrier(family, actors) {
            b.off(scorer, StatKind::Touchdowns, 1);
        }
        return b.finish(ctx.category, yards, OutcomeKind::Touchdown, actors);
    }
    if end <= 0 {
        let yards = -ctx.spot;
        b.scrimmage(family, actors, yards);
        if let Some(tackler) = actors.defender {
            b.def(tackler, StatKind::Safeties, 1);
        }
        return b.finish(ctx.category, yards, OutcomeKind::Safety { sack: false }, actors);
    }

    let fumble = FUMBLE_BASE * ctx.weather.fumble * ctx.offense.volatility.miscue;
    if roll_chance(rng, fumble) {
        let by = if roll_chance(rng, FUMBLE_RECOVERY_BY_OFFENSE) {
            ctx.offense.team
        } else {
            ctx.defense.team
        };
        b.scrimmage(family, actors, yards);
        let fumbler = ball_carrier(family, actors);
        if by == ctx.offense.team {
            if let Some(fumbler) = fumbler {
                b.off(fumbler, StatKind::FumbleRecoveries, 1);
            }
        } else {
            if let Some(fumbler) = fumbler {
                b.off(fumbler, StatKind::FumblesLost, 1);
            }
            if let Some(defender) = actors.defender {
                b.def(defender, StatKind::FumbleRecoveries, 1);
            }
        }
        return b.finish(ctx.category, yards, OutcomeKind::FumbleRecovered { by }, actors);
    }

    b.scrimmage(family, actors, yards);
    if let Some(tackler) = actors.defender {
        b.def(tackler, StatKind::Tackles, 1);
    }
    b.finish(ctx.category, yards, OutcomeKind::Gain, actors)
}

fn run_carrier<'a>(squad: &Squad<'a>, category: PlayCategory) -> &'a Participant {
    match category {
        PlayCategory::Sweep => squad
            .carriers()
            .iter()
            .copied()
            .max_by_key(|p| (p.ratings.speed, std::cmp::Reverse(p.id)))
            .unwrap_or(squad.lead_carrier()),
        PlayCategory::Counter => squad
            .carriers()
            .get(1)
            .copied()
            .unwrap_or(squad.lead_carrier()),
        _ => squad.lead_carrier(),
    }
}

fn line_battle(ctx: &PlayContext<'_>, blocking_scale: f64) -> Contest {
    let offense = ctx
        .offense
        .contestant(ctx.offense.squad.blocking_unit())
        .scaled(blocking_scale);
    let defense = ctx
        .defense
        .contestant(ctx.defense.squad.rush_unit())
        .scaled(ctx.call.personnel.run_factor());
    contest::resolve(ContestKind::LineBattle, &offense, &defense, 0.5)
}

fn resolve_run<R: Rng + ?Sized>(ctx: &PlayContext<'_>, rng: &mut R) -> PlayOutcome {
    let category = ctx.category;
    let (kind, table) = match category {
        PlayCategory::Dive => (ContestKind::InsideRun, DIVE_GAIN),
        PlayCategory::Power => (ContestKind::InsideRun, POWER_GAIN),
        PlayCategory::Sweep => (ContestKind::OutsideRun, SWEEP_GAIN),
        _ => (ContestKind::CutbackRun, COUNTER_GAIN),
    };
    let heavy = ctx.formation == Formation::Heavy
        && matches!(category, PlayCategory::Dive | PlayCategory::Power);
    let line = line_battle(ctx, if heavy { HEAVY_BLOCKING_BONUS } else { 1.0 });

    let carrier = run_carrier(ctx.offense.squad, category);
    let pursuit = ctx
        .defense
        .contestant(ctx.defense.squad.coverage_unit())
        .scaled(ctx.call.personnel.run_factor());
    let run = contest::resolve(kind, &ctx.offense.player(carrier), &pursuit, 0.5);
    let edge = line.edge.mul_add(0.5, run.edge);

    let tacklers = ctx.defense.squad.tacklers();
    let tackler = pick_participant(
        rng,
        &tacklers,
        |p| f64::from(p.ratings.tackling),
        ctx.defense.squad.lead_carrier(),
    );
    let yards = round_yards(gain(rng, table, edge));
    let actors = Actors {
        primary: Some(carrier.id),
        secondary: None,
        defender: Some(tackler.id),
    };
    finish_scrimmage(
        ctx,
        rng,
        actors,
        yards,
        ctx.offense_identity.ext(offense_keys::BREAKAWAY_BONUS),
    )
}

fn lateral_initiator<'a>(squad: &Squad<'a>) -> &'a Participant {
    squad
        .carriers()
        .iter()
        .chain(squad.receivers().iter())
        .copied()
        .max_by_key(|p| (p.ratings.lateral_skill, std::cmp::Reverse(p.id)))
        .unwrap_or(squad.lead_carrier())
}

/// Interception return from the catch point; the defense's goal is `catch_to_goal` away.
fn interception<R: Rng + ?Sized>(
    ctx: &PlayContext<'_>,
    rng: &mut R,
    kind: InterceptionKind,
    passer: PlayerId,
    depth: i32,
) -> PlayOutcome {
    let mut b = Builder::new(ctx.offense.team);
    let squad = ctx.defense.squad;
    let pool = squad.tacklers();
    let interceptor = pick_participant(rng, &pool, |p| f64::from(p.ratings.hands), squad.returner());
    let catch_spot = (ctx.spot + depth).clamp(1, FIELD_LENGTH - 1);
    let to_goal = catch_spot;
    let contest = return_contest(ctx, interceptor);
    let mut return_yards = round_yards(gain(rng, RETURN_GAIN, contest.edge)).max(0);
    if roll_chance(rng, RETURN_BREAKAWAY) {
        return_yards += round_yards(gain(rng, BREAKAWAY_EXTRA, 0.0)).max(1);
    }
    let touchdown = return_yards >= to_goal;
    let return_yards = return_yards.min(to_goal);

    match kind {
        InterceptionKind::Lateral => b.off(passer, StatKind::LateralChains, 1),
        InterceptionKind::KickPass => b.off(passer, StatKind::KickPassAttempts, 1),
    }
    b.off(passer, StatKind::InterceptionsThrown, 1);
    b.def(interceptor.id, StatKind::Interceptions, 1);
    b.def(
        interceptor.id,
        StatKind::InterceptionReturnYards,
        i64::from(return_yards),
    );
    let outcome = if touchdown {
        b.def(interceptor.id, StatKind::Touchdowns, 1);
        OutcomeKind::InterceptionReturnTouchdown { kind, return_yards }
    } else {
        OutcomeKind::Interception { kind, return_yards }
    };
    let actors = Actors {
        primary: Some(passer),
        secondary: None,
        defender: Some(interceptor.id),
    };
    b.finish(ctx.category, 0, outcome, actors)
}

fn resolve_lateral<R: Rng + ?Sized>(ctx: &PlayContext<'_>, rng: &mut R) -> PlayOutcome {
    let initiator = lateral_initiator(ctx.offense.squad);
    let spread = if ctx.formation == Formation::Spread {
        SPREAD_SKILL_BONUS
    } else {
        1.0
    };
    let offense = ctx.offense.player(initiator).scaled(spread);
    let pursuit = ctx
        .defense
        .contestant(ctx.defense.squad.coverage_unit())
        .scaled(ctx.defense_identity.ext(defense_keys::LATERAL_PURSUIT));
    let chain = contest::resolve(
        ContestKind::LateralChain,
        &offense,
        &pursuit,
        1.0 - LATERAL_FAILURE_BASE * ctx.offense.volatility.miscue,
    );

    if !roll_chance(rng, chain.probability) {
        if roll_chance(rng, LATERAL_INTERCEPTION_SHARE) {
            return interception(
                ctx,
                rng,
                InterceptionKind::Lateral,
                initiator.id,
                0,
            );
        }
        let tacklers = ctx.defense.squad.tacklers();
        let tackler = pick_participant(
            rng,
            &tacklers,
            |p| f64::from(p.ratings.speed),
            ctx.defense.squad.returner(),
        );
        let loss = round_yards(gain(rng, LATERAL_FAILURE_LOSS, 0.0)).min(0);
        let actors = Actors {
            primary: Some(initiator.id),
            secondary: None,
            defender: Some(tackler.id),
        };
        return finish_scrimmage(ctx, rng, actors, loss, 0.0);
    }

    let tacklers = ctx.defense.squad.tacklers();
    let tackler = pick_participant(
        rng,
        &tacklers,
        |p| f64::from(p.ratings.speed),
        ctx.defense.squad.returner(),
    );
    let yards = round_yards(gain(rng, LATERAL_GAIN, chain.edge));
    let actors = Actors {
        primary: Some(initiator.id),
        secondary: None,
        defender: Some(tackler.id),
    };
    finish_scrimmage(
        ctx,
        rng,
        actors,
        yards,
        ctx.offense_identity.ext(offense_keys::BREAKAWAY_BONUS),
    )
}

/// Passer's kicking with the receiver's hands, speed and read.
fn passing_unit(passer: &Participant, receiver: &Participant) -> UnitRatings {
    let kicking = UnitRatings::from(&passer.ratings);
    UnitRatings {
        kick_accuracy: kicking.kick_accuracy,
        kick_power: kicking.kick_power,
        ..UnitRatings::from(&receiver.ratings)
    }
}

fn resolve_kick_pass<R: Rng + ?Sized>(ctx: &PlayContext<'_>, rng: &mut R) -> PlayOutcome {
    let deep = ctx.category == PlayCategory::DeepKickPass;
    let squad = ctx.offense.squad;
    let passer = squad.kicker();
    let intensity = if ctx.call.blitz {
        ctx.defense_identity.blitz_intensity
    } else {
        0.0
    };

    let protection = ctx.offense.contestant(squad.blocking_unit());
    let rush = ctx.defense.contestant(ctx.defense.squad.rush_unit());
    let sack_base = SACK_BLITZ_BONUS.mul_add(intensity, SACK_BASE);
    let pocket = contest::resolve(ContestKind::PassRush, &protection, &rush, 1.0 - sack_base);
    if !roll_chance(rng, pocket.probability) {
        let rusher = pick_participant(
            rng,
            ctx.defense.squad.rushers(),
            |p| f64::from(p.ratings.power),
            ctx.defense.squad.returner(),
        );
        let loss = round_yards(gain(rng, SACK_LOSS, 0.0)).max(1);
        let mut b = Builder::new(ctx.offense.team);
        let actors = Actors {
            primary: Some(passer.id),
            secondary: None,
            defender: Some(rusher.id),
        };
        let (yards, kind) = if ctx.spot - loss <= 0 {
            (-ctx.spot, OutcomeKind::Safety { sack: true })
        } else {
            (-loss, OutcomeKind::Sack)
        };
        b.def(rusher.id, StatKind::Sacks, 1);
        b.def(rusher.id, StatKind::SackYardsLost, i64::from(-yards));
        if matches!(kind, OutcomeKind::Safety { .. }) {
            b.def(rusher.id, StatKind::Safeties, 1);
        }
        return b.finish(ctx.category, yards, kind, actors);
    }

    let ranked: Vec<(&Participant, f64)> = squad
        .receivers()
        .iter()
        .copied()
        .zip(RECEIVER_RANK_WEIGHTS)
        .collect();
    let receiver = pick_weighted(rng, &ranked)
        .copied()
        .unwrap_or(squad.lead_carrier());

    let spread = if ctx.formation == Formation::Spread {
        SPREAD_SKILL_BONUS
    } else {
        1.0
    };
    let offense = ctx
        .offense
        .contestant(passing_unit(passer, receiver))
        .scaled(spread);
    let coverage_scale = ctx.call.personnel.coverage_factor()
        * (1.0 + ctx.defense_identity.ext(defense_keys::COVERAGE_BIAS))
        * BLITZ_COVERAGE_COST.mul_add(-intensity, 1.0);
    let coverage = ctx
        .defense
        .contestant(ctx.defense.squad.coverage_unit())
        .scaled(coverage_scale);
    let (kind, completion, pick, depth, table) = if deep {
        (
            ContestKind::DeepKickPass,
            DEEP_COMPLETION_BASE,
            DEEP_INTERCEPTION_BASE,
            DEEP_PASS_DEPTH,
            DEEP_PASS_GAIN,
        )
    } else {
        (
            ContestKind::ShortKickPass,
            SHORT_COMPLETION_BASE,
            SHORT_INTERCEPTION_BASE,
            SHORT_PASS_DEPTH,
            SHORT_PASS_GAIN,
        )
    };
    let throw = contest::resolve(kind, &offense, &coverage, completion);

    let pick_chance = clamp_probability(
        pick * ctx.offense.volatility.miscue - throw.edge * EDGE_PROBABILITY_SCALE * 0.1,
    );
    if roll_chance(rng, pick_chance) {
        let depth = depth.min(FIELD_LENGTH - 1 - ctx.spot);
        return interception(
            ctx,
            rng,
            InterceptionKind::KickPass,
            passer.id,
            depth,
        );
    }

    let tacklers = ctx.defense.squad.tacklers();
    let defender = pick_participant(
        rng,
        &tacklers,
        |p| f64::from(p.ratings.speed),
        ctx.defense.squad.returner(),
    );
    if !roll_chance(rng, throw.probability) {
        let mut b = Builder::new(ctx.offense.team);
        b.off(passer.id, StatKind::KickPassAttempts, 1);
        let actors = Actors {
            primary: Some(passer.id),
            secondary: Some(receiver.id),
            defender: Some(defender.id),
        };
        return b.finish(ctx.category, 0, OutcomeKind::KickPassIncomplete, actors);
    }

    let yards = round_yards(gain(rng, table, throw.edge));
    let actors = Actors {
        primary: Some(passer.id),
        secondary: Some(receiver.id),
        defender: Some(defender.id),
    };
    finish_scrimmage(
        ctx,
        rng,
        actors,
        yards,
        ctx.offense_identity.ext(offense_keys::BREAKAWAY_BONUS),
    )
}

fn return_contest(ctx: &PlayContext<'_>, returner: &Participant) -> Contest {
    let runner = ctx.defense.player(returner);
    let coverage = ctx.offense.contestant(ctx.offense.squad.coverage_unit());
    contest::resolve(ContestKind::Return, &runner, &coverage, 0.5)
}

enum Fielded {
    Pindown,
    Returned { return_yards: i32, start: i32 },
    Touchdown { return_yards: i32 },
}

/// Receiving team fields a kick `catch_spot` yards from its own goal line
/// (0 = in the end zone).
fn field_kick<R: Rng + ?Sized>(
    ctx: &PlayContext<'_>,
    rng: &mut R,
    returner: &Participant,
    catch_spot: i32,
) -> Fielded {
    let contest = return_contest(ctx, returner);
    if catch_spot <= 0 {
        let failure = END_ZONE_RETURN_FAILURE - contest.edge * EDGE_PROBABILITY_SCALE;
        if roll_chance(rng, failure) {
            return Fielded::Pindown;
        }
    }
    let mut return_yards = round_yards(gain(rng, RETURN_GAIN, contest.edge)).max(0);
    if roll_chance(rng, RETURN_BREAKAWAY) {
        return_yards += round_yards(gain(rng, BREAKAWAY_EXTRA, 0.0)).max(1);
    }
    let catch_spot = catch_spot.max(0);
    if catch_spot == 0 && return_yards == 0 {
        return Fielded::Pindown;
    }
    let start = catch_spot + return_yards;
    if start >= FIELD_LENGTH {
        return Fielded::Touchdown {
            return_yards: FIELD_LENGTH - catch_spot,
        };
    }
    Fielded::Returned {
        return_yards,
        start: start.max(1),
    }
}

/// Block check shared by every kick; `Some` when the kick was blocked.
fn blocked_kick<R: Rng + ?Sized>(
    ctx: &PlayContext<'_>,
    rng: &mut R,
    kick: KickKind,
    kicker: &Participant,
) -> Option<PlayOutcome> {
    let protection = ctx.offense.contestant(ctx.offense.squad.blocking_unit());
    let rush = ctx.defense.contestant(ctx.defense.squad.rush_unit());
    let shield = contest::resolve(ContestKind::KickBlock, &protection, &rush, 1.0 - BLOCK_BASE);
    if roll_chance(rng, shield.probability) {
        return None;
    }
    let blocker = pick_participant(
        rng,
        ctx.defense.squad.rushers(),
        |p| f64::from(p.ratings.power),
        ctx.defense.squad.returner(),
    );
    let loose_spot = (ctx.spot - BLOCKED_KICK_LOSS).max(1);
    let mut b = Builder::new(ctx.offense.team);
    match kick {
        KickKind::DropKick => b.off(kicker.id, StatKind::DropKicksAttempted, 1),
        KickKind::PlaceKick => b.off(kicker.id, StatKind::PlaceKicksAttempted, 1),
        KickKind::Punt => b.off(kicker.id, StatKind::Punts, 1),
    }
    b.def(blocker.id, StatKind::KicksBlocked, 1);

    if !roll_chance(rng, BLOCKED_KICK_DEFENSE_RECOVERY) {
        b.off(kicker.id, StatKind::BlockedKickYardsLost, i64::from(ctx.spot - loose_spot));
        let actors = Actors {
            primary: Some(kicker.id),
            secondary: None,
            defender: Some(blocker.id),
        };
        return Some(b.finish(
            ctx.category,
            loose_spot - ctx.spot,
            OutcomeKind::BlockedKick {
                kick,
                recovered_by: ctx.offense.team,
                return_yards: 0,
            },
            actors,
        ));
    }

    let tacklers = ctx.defense.squad.tacklers();
    let recoverer = pick_participant(
        rng,
        &tacklers,
        |p| f64::from(p.ratings.awareness),
        blocker,
    );
    let to_goal = loose_spot;
    let contest = return_contest(ctx, recoverer);
    let runback = round_yards(gain(rng, RETURN_GAIN, contest.edge)).max(0);
    let actors = Actors {
        primary: Some(kicker.id),
        secondary: Some(recoverer.id),
        defender: Some(blocker.id),
    };
    if runback >= to_goal {
        b.def(recoverer.id, StatKind::KickReturnYards, i64::from(to_goal));
        b.def(recoverer.id, StatKind::Touchdowns, 1);
        return Some(b.finish(
            ctx.category,
            0,
            OutcomeKind::BlockedKickReturnTouchdown {
                kick,
                return_yards: to_goal,
            },
            actors,
        ));
    }
    b.def(recoverer.id, StatKind::KickReturnYards, i64::from(runback));
    Some(b.finish(
        ctx.category,
        0,
        OutcomeKind::BlockedKick {
            kick,
            recovered_by: ctx.defense.team,
            return_yards: runback,
        },
        actors,
    ))
}

fn resolve_scoring_kick<R: Rng + ?Sized>(
    ctx: &PlayContext<'_>,
    kick: KickKind,
    rng: &mut R,
) -> PlayOutcome {
    let kicker = ctx.offense.squad.kicker();
    if let Some(blocked) = blocked_kick(ctx, rng, kick, kicker) {
        return blocked;
    }
    let distance = FIELD_LENGTH - ctx.spot + KICK_SETBACK_YARDS;
    let make = kick_make_probability(
        kick,
        distance,
        &UnitRatings::from(&kicker.ratings),
        &ctx.weather,
        ctx.offense.volatility,
    );
    let (attempt, made) = match kick {
        KickKind::DropKick => (StatKind::DropKicksAttempted, StatKind::DropKicksMade),
        _ => (StatKind::PlaceKicksAttempted, StatKind::PlaceKicksMade),
    };
    let mut b = Builder::new(ctx.offense.team);
    b.off(kicker.id, attempt, 1);
    if roll_chance(rng, make) {
        b.off(kicker.id, made, 1);
        let kind = match kick {
            KickKind::DropKick => OutcomeKind::DropKickGood { distance },
            _ => OutcomeKind::PlaceKickGood { distance },
        };
        let actors = Actors {
            primary: Some(kicker.id),
            ..Actors::default()
        };
        return b.finish(ctx.category, 0, kind, actors);
    }

    let returner = ctx.defense.squad.returner();
    let actors = Actors {
        primary: Some(kicker.id),
        secondary: None,
        defender: Some(returner.id),
    };
    match field_kick(ctx, rng, returner, 0) {
        Fielded::Pindown => {
            b.off(kicker.id, StatKind::Pindowns, 1);
            b.finish(ctx.category, 0, OutcomeKind::Pindown { kick, distance }, actors)
        }
        Fielded::Returned { return_yards, .. } => {
            b.def(returner.id, StatKind::KickReturnYards, i64::from(return_yards));
            b.finish(
                ctx.category,
                0,
                OutcomeKind::MissedKickReturn {
                    kick,
                    distance,
                    return_yards,
                    touchdown: false,
                },
                actors,
            )
        }
        Fielded::Touchdown { return_yards } => {
            b.def(returner.id, StatKind::KickReturnYards, i64::from(return_yards));
            b.def(returner.id, StatKind::Touchdowns, 1);
            b.finish(
                ctx.category,
                0,
                OutcomeKind::MissedKickReturn {
                    kick,
                    distance,
                    return_yards,
                    touchdown: true,
                },
                actors,
            )
        }
    }
}

fn resolve_punt<R: Rng + ?Sized>(ctx: &PlayContext<'_>, rng: &mut R) -> PlayOutcome {
    let kicker = ctx.offense.squad.kicker();
    if let Some(blocked) = blocked_kick(ctx, rng, KickKind::Punt, kicker) {
        return blocked;
    }
    let power = UnitRatings::from(&kicker.ratings).kick_power;
    let raw = PUNT_SPREAD.mul_add(
        triangular(rng),
        PUNT_DISTANCE_PER_POWER.mul_add(power, PUNT_BASE_DISTANCE),
    ) * ctx.weather.kick_distance;
    let flight = round_yards(raw).max(10);
    let landing = ctx.spot + flight;
    let distance = landing.min(FIELD_LENGTH) - ctx.spot;

    let mut b = Builder::new(ctx.offense.team);
    b.off(kicker.id, StatKind::Punts, 1);
    b.off(kicker.id, StatKind::PuntYards, i64::from(distance));
    let returner = ctx.defense.squad.returner();
    let actors = Actors {
        primary: Some(kicker.id),
        secondary: None,
        defender: Some(returner.id),
    };

    let result = if landing >= FIELD_LENGTH + PUNT_TOUCHBACK_DEPTH {
        PuntResult::Touchback
    } else {
        let catch_spot = (FIELD_LENGTH - landing).max(0);
        match field_kick(ctx, rng, returner, catch_spot) {
            Fielded::Pindown => {
                b.off(kicker.id, StatKind::Pindowns, 1);
                PuntResult::Pindown
            }
            Fielded::Returned {
                return_yards,
                start,
            } => {
                b.def(returner.id, StatKind::KickReturnYards, i64::from(return_yards));
                PuntResult::Returned {
                    return_yards,
                    start,
                }
            }
            Fielded::Touchdown { return_yards } => {
                b.def(returner.id, StatKind::KickReturnYards, i64::from(return_yards));
                b.def(returner.id, StatKind::Touchdowns, 1);
                PuntResult::ReturnTouchdown { return_yards }
            }
        }
    };
    b.finish(ctx.category, 0, OutcomeKind::Punt { distance, result }, actors)
}

fn resolve_kneel(ctx: &PlayContext<'_>) -> PlayOutcome {
    let loss = KNEEL_LOSS.min(ctx.spot - 1).max(0);
    let carrier = ctx.offense.squad.lead_carrier().id;
    let actors = Actors {
        primary: Some(carrier),
        ..Actors::default()
    };
    let mut b = Builder::new(ctx.offense.team);
    b.off(carrier, StatKind::RushAttempts, 1);
    b.off(carrier, StatKind::RushYards, i64::from(-loss));
    b.finish(PlayCategory::Kneel, -loss, OutcomeKind::Kneel, actors)
}

/// Roll for a flag on a live play that keeps the ball with the offense.
///
/// The flag is attached and credited before the play reaches the ledger,
/// and walk-off yards never move the ball off the field.
pub fn assess_penalty<R: Rng + ?Sized>(
    outcome: &mut PlayOutcome,
    ctx: &PlayContext<'_>,
    cfg: &OfficiatingConfig,
    rng: &mut R,
) {
    if !matches!(outcome.kind, OutcomeKind::Gain | OutcomeKind::KickPassIncomplete) {
        return;
    }
    if !roll_chance(rng, cfg.penalty_rate) {
        return;
    }
    let on_offense = roll_chance(rng, cfg.offense_share);
    let end = ctx.spot + outcome.yards;
    let (kind, side, pool, max_yards, walk) = if on_offense {
        (
            PenaltyKind::Holding,
            ctx.offense,
            ctx.offense.squad.blockers(),
            end - 1,
            HOLDING_YARDS,
        )
    } else {
        (
            PenaltyKind::Offside,
            ctx.defense,
            ctx.defense.squad.rushers(),
            FIELD_LENGTH - 1 - end,
            OFFSIDE_YARDS,
        )
    };
    let player = pick_participant(rng, pool, |_| 1.0, side.squad.lead_carrier());
    let yards = walk.min(max_yards);
    if yards <= 0 {
        return;
    }
    outcome.penalty = Some(Penalty {
        kind,
        team: side.team,
        player: player.id,
        yards,
    });
    outcome
        .credits
        .push(Credit::one(side.team, player.id, StatKind::Penalties));
    outcome.credits.push(Credit::new(
        side.team,
        player.id,
        StatKind::PenaltyYards,
        i64::from(yards),
    ));
}

fn name(squad: &Squad<'_>, id: Option<PlayerId>) -> String {
    id.and_then(|id| squad.sheet().participant(id))
        .map_or_else(|| "unknown".to_string(), |p| format!("{} {}", p.id, p.name))
}

/// One-line play-by-play text.
#[must_use]
pub fn describe(outcome: &PlayOutcome, offense: &Squad<'_>, defense: &Squad<'_>) -> String {
    let who = name(offense, outcome.actors.primary);
    let target = name(offense, outcome.actors.secondary);
    let defender = name(defense, outcome.actors.defender);
    let yards = outcome.yards;
    let category = outcome.category.label();
    let mut text = match &outcome.kind {
        OutcomeKind::Gain | OutcomeKind::FumbleRecovered { .. }
            if outcome.category.family() == PlayFamily::KickPass =>
        {
            format!("{who} {category} to {target} for {yards}, tackled by {defender}")
        }
        OutcomeKind::Gain | OutcomeKind::FumbleRecovered { .. } => {
            format!("{who} {category} for {yards}, tackled by {defender}")
        }
        OutcomeKind::KickPassIncomplete => {
            format!("{who} {category} intended for {target} falls incomplete")
        }
        OutcomeKind::Touchdown => format!("{who} {category} {yards} yards, TOUCHDOWN"),
        OutcomeKind::DropKickGood { distance } => format!("{who} drop kick from {distance} is good"),
        OutcomeKind::PlaceKickGood { distance } => {
            format!("{who} place kick from {distance} is good")
        }
        OutcomeKind::Safety { sack: true } => format!("{who} sacked in the end zone by {defender}, SAFETY"),
        OutcomeKind::Safety { sack: false } => {
            format!("{who} {category} tackled in the end zone by {defender}, SAFETY")
        }
        OutcomeKind::Pindown { distance, .. } => {
            format!("{who} misses from {distance}, downed in the end zone by {defender}, PINDOWN")
        }
        OutcomeKind::Interception { return_yards, .. } => {
            format!("{who} {category} intercepted by {defender}, returned {return_yards}")
        }
        OutcomeKind::InterceptionReturnTouchdown { return_yards, .. } => format!(
            "{who} {category} intercepted by {defender}, returned {return_yards} for a TOUCHDOWN"
        ),
        OutcomeKind::Sack => format!("{who} sacked by {defender} for {yards}"),
        OutcomeKind::BlockedKick { recovered_by, .. } => format!(
            "{who} {category} blocked by {defender}, recovered by {}",
            recovered_by.label()
        ),
        OutcomeKind::BlockedKickReturnTouchdown { return_yards, .. } => format!(
            "{who} {category} blocked by {defender}, returned {return_yards} for a TOUCHDOWN"
        ),
        OutcomeKind::MissedKickReturn {
            distance,
            return_yards,
            touchdown,
            ..
        } => {
            let tail = if *touchdown { ", TOUCHDOWN" } else { "" };
            format!("{who} misses from {distance}, {defender} returns {return_yards}{tail}")
        }
        OutcomeKind::TurnoverOnDowns { play } => {
            format!("{who} {category} ({}) short on sixth down, turnover on downs", play.tag())
        }
        OutcomeKind::Punt { distance, result } => {
            let tail = match result {
                PuntResult::Returned { return_yards, .. } => {
                    format!("{defender} returns {return_yards}")
                }
                PuntResult::ReturnTouchdown { return_yards } => {
                    format!("{defender} returns {return_yards} for a TOUCHDOWN")
                }
                PuntResult::Pindown => "downed in the end zone, PINDOWN".to_string(),
                PuntResult::Touchback => "touchback".to_string(),
            };
            format!("{who} punts {distance}, {tail}")
        }
        OutcomeKind::Kneel => format!("{who} kneels"),
    };
    if let OutcomeKind::FumbleRecovered { by } = outcome.kind {
        text.push_str(&format!(", fumble recovered by {}", by.label()));
    }
    if let Some(penalty) = outcome.penalty {
        text.push_str(&format!(
            " [{:?} on {} {}, {} yards]",
            penalty.kind,
            penalty.team.label(),
            penalty.player,
            penalty.yards
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{balanced_identity, demo_matchup};
    use crate::ledger::sum_credits;
    use crate::play::Personnel;
    use crate::weather::Weather;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn with_context<T>(
        category: PlayCategory,
        spot: i32,
        f: impl Fn(&PlayContext<'_>) -> T,
    ) -> T {
        let matchup = demo_matchup();
        let home = matchup.home.squad().unwrap();
        let away = matchup.away.squad().unwrap();
        let identity = balanced_identity();
        let tracker = AdaptationTracker::new();
        let adaptation = AdaptationConfig::default();
        let ctx = PlayContext {
            offense: SideContext {
                team: TeamSide::Home,
                squad: &home,
                volatility: Volatility::CALM,
                freshness: 1.0,
            },
            defense: SideContext {
                team: TeamSide::Away,
                squad: &away,
                volatility: Volatility::CALM,
                freshness: 1.0,
            },
            offense_identity: &identity.offense,
            defense_identity: &identity.defense,
            spot,
            category,
            formation: if category.is_kick() {
                Formation::Kick
            } else {
                Formation::Balanced
            },
            call: DefensiveCall {
                personnel: Personnel::Base,
                blitz: false,
            },
            weather: Weather::Clear.effect(),
            adaptation: &tracker,
            adaptation_config: &adaptation,
        };
        f(&ctx)
    }

    #[test]
    fn credits_always_mirror_structural_deltas() {
        for category in PlayCategory::CALLABLE
            .into_iter()
            .chain([PlayCategory::Kneel])
        {
            for spot in [2, 35, 60, 88, 97] {
                with_context(category, spot, |ctx| {
                    let mut rng = ChaCha8Rng::seed_from_u64(u64::try_from(spot).unwrap());
                    for _ in 0..300 {
                        let mut outcome = resolve_play(ctx, &mut rng);
                        assess_penalty(&mut outcome, ctx, &OfficiatingConfig::default(), &mut rng);
                        assert_eq!(
                            sum_credits(&outcome.credits),
                            outcome.team_deltas(),
                            "{category:?} at {spot}: {:?}",
                            outcome.kind
                        );
                        assert_eq!(outcome.offense, TeamSide::Home);
                        let end = spot + outcome.net_yards();
                        if outcome.kind.keeps_possession(TeamSide::Home) {
                            assert!((1..FIELD_LENGTH).contains(&end), "{outcome:?}");
                        }
                    }
                });
            }
        }
    }

    #[test]
    fn same_stream_state_gives_same_outcome() {
        with_context(PlayCategory::DeepKickPass, 40, |ctx| {
            let mut a = ChaCha8Rng::seed_from_u64(99);
            let mut b = ChaCha8Rng::seed_from_u64(99);
            for _ in 0..50 {
                assert_eq!(resolve_play(ctx, &mut a), resolve_play(ctx, &mut b));
            }
        });
    }

    #[test]
    fn touchdowns_credit_the_ball_carrier() {
        with_context(PlayCategory::ShortKickPass, 97, |ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(4);
            let mut seen = false;
            for _ in 0..400 {
                let outcome = resolve_play(ctx, &mut rng);
                if outcome.kind == OutcomeKind::Touchdown {
                    seen = true;
                    assert_eq!(outcome.yards, 3);
                    let receiver = outcome.actors.secondary.unwrap();
                    assert!(outcome.credits.iter().any(|c| c.player == receiver
                        && c.kind == StatKind::Touchdowns));
                }
            }
            assert!(seen);
        });
    }

    #[test]
    fn scoring_kicks_from_close_range_mostly_score() {
        with_context(PlayCategory::PlaceKick, 85, |ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(8);
            let good = (0..500)
                .filter(|_| {
                    matches!(
                        resolve_play(ctx, &mut rng).kind,
                        OutcomeKind::PlaceKickGood { distance: 25 }
                    )
                })
                .count();
            assert!(good > 300, "{good}");
        });
    }

    #[test]
    fn punts_from_deep_own_territory_stay_on_the_field() {
        with_context(PlayCategory::Punt, 5, |ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(12);
            for _ in 0..300 {
                let outcome = resolve_play(ctx, &mut rng);
                if let OutcomeKind::Punt {
                    result: PuntResult::Returned { start, .. },
                    ..
                } = outcome.kind
                {
                    assert!((1..FIELD_LENGTH).contains(&start));
                }
            }
        });
    }

    #[test]
    fn kneel_never_crosses_the_goal_line() {
        with_context(PlayCategory::Kneel, 1, |ctx| {
            let outcome = resolve_kneel(ctx);
            assert_eq!(outcome.yards, 0);
            assert!(outcome.credits.iter().all(|c| c.kind != StatKind::RushYards || c.value == 0));
        });
    }

    #[test]
    fn kneel_loss_is_charged_to_the_lead_carrier() {
        with_context(PlayCategory::Kneel, 40, |ctx| {
            let outcome = resolve_kneel(ctx);
            assert_eq!(outcome.yards, -1);
            let carrier = ctx.offense.squad.lead_carrier().id;
            assert_eq!(outcome.actors.primary, Some(carrier));
            assert!(outcome.credits.iter().any(|c| c.player == carrier
                && c.kind == StatKind::RushYards
                && c.value == -1));
            assert_eq!(sum_credits(&outcome.credits), outcome.team_deltas());
        });
    }

    #[test]
    fn kicking_unit_recovering_its_blocked_kick_is_charged_the_lost_ground() {
        with_context(PlayCategory::Punt, 40, |ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(21);
            let mut seen = 0;
            for _ in 0..6000 {
                let outcome = resolve_play(ctx, &mut rng);
                let OutcomeKind::BlockedKick { recovered_by, .. } = outcome.kind else {
                    continue;
                };
                if recovered_by != TeamSide::Home {
                    continue;
                }
                seen += 1;
                assert_eq!(outcome.yards, -BLOCKED_KICK_LOSS);
                let charged: i64 = outcome
                    .credits
                    .iter()
                    .filter(|c| c.kind == StatKind::BlockedKickYardsLost)
                    .map(|c| {
                        assert_eq!(Some(c.player), outcome.actors.primary);
                        c.value
                    })
                    .sum();
                assert_eq!(charged, i64::from(BLOCKED_KICK_LOSS));
                assert_eq!(sum_credits(&outcome.credits), outcome.team_deltas());
            }
            assert!(seen > 0);
        });
    }

    #[test]
    fn descriptions_name_the_players() {
        with_context(PlayCategory::Dive, 30, |ctx| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let outcome = resolve_play(ctx, &mut rng);
            let text = describe(&outcome, ctx.offense.squad, ctx.defense.squad);
            let carrier = ctx.offense.squad.lead_carrier();
            assert!(text.contains(&carrier.name), "{text}");
        });
    }
}
