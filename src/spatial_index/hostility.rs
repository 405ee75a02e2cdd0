use crate::constants::teams::MAX_TEAMS;
use crate::world::TeamId;

/// Resolved hostility relation supplied by the caller
///
/// Implementations only see valid, non-neutral team ids; the query layer
/// filters neutral and invalid teams before asking.
pub trait Hostility {
    fn is_hostile(&self, a: TeamId, b: TeamId) -> bool;
}

/// Every team is hostile to every other team
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctTeams;

impl Hostility for DistinctTeams {
    fn is_hostile(&self, a: TeamId, b: TeamId) -> bool {
        a != b
    }
}

impl<F> Hostility for F
where
    F: Fn(TeamId, TeamId) -> bool,
{
    fn is_hostile(&self, a: TeamId, b: TeamId) -> bool {
        self(a, b)
    }
}

/// Symmetric alliance matrix; teams are hostile unless equal or allied
#[derive(Debug, Clone)]
pub struct AllianceTable {
    /// Bit `b` of `allies[a]` is set when teams `a` and `b` are allied
    allies: [u32; MAX_TEAMS],
}

impl Default for AllianceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AllianceTable {
    pub fn new() -> Self {
        Self { allies: [0; MAX_TEAMS] }
    }

    fn slot(team: TeamId) -> Option<usize> {
        usize::try_from(team.0).ok().filter(|&t| t < MAX_TEAMS)
    }

    /// Ally two teams. Ids outside the table are ignored.
    pub fn ally(&mut self, a: TeamId, b: TeamId) {
        if let (Some(a), Some(b)) = (Self::slot(a), Self::slot(b)) {
            self.allies[a] |= 1 << b;
            self.allies[b] |= 1 << a;
        }
    }

    pub fn break_alliance(&mut self, a: TeamId, b: TeamId) {
        if let (Some(a), Some(b)) = (Self::slot(a), Self::slot(b)) {
            self.allies[a] &= !(1 << b);
            self.allies[b] &= !(1 << a);
        }
    }

    pub fn are_allied(&self, a: TeamId, b: TeamId) -> bool {
        match (Self::slot(a), Self::slot(b)) {
            (Some(x), Some(y)) => x == y || self.allies[x] & (1 << y) != 0,
            _ => false,
        }
    }
}

impl Hostility for AllianceTable {
    fn is_hostile(&self, a: TeamId, b: TeamId) -> bool {
        a != b && !self.are_allied(a, b)
    }
}
