use rand::Rng;

use crate::api::proposal_dto::ProposalDto;
use crate::api::scenario_dto::ScenarioDto;
use crate::domain::batch::proposal::{Proposal, ProposalQueue};
use crate::domain::batch::wallet::Wallet;
use crate::domain::batch::wallet_reordering::{BatchConfig, WalletBasedReordering};
use crate::domain::intersection::topology::Intersection;
use crate::domain::reservation::config::ReservationGridConfig;
use crate::domain::reservation::grid_manager::ReservationGridManager;
use crate::domain::reservation::query::Query;
use crate::domain::utils::id::{LaneId, Vin};
use crate::domain::vehicle::vehicle_spec_registry::VehicleSpecRegistry;
use crate::error::{Error, Result};

/// Outcome of one [`IntersectionSimulator::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Manager time at the start of the tick.
    pub time: f64,
    pub confirmed: Vec<Vin>,
    pub rejected: Vec<Vin>,
    pub expired: Vec<Vin>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.confirmed.is_empty() && self.rejected.is_empty() && self.expired.is_empty()
    }
}

/// Drives batch admission against one reservation grid.
///
/// Proposals wait in a time-ordered queue until a batch picks them up. A confirmed
/// proposal leaves the queue, a rejected one stays and competes again in the next
/// batch until its arrival time has passed.
#[derive(Debug)]
pub struct IntersectionSimulator {
    registry: VehicleSpecRegistry,
    manager: ReservationGridManager,
    reordering: WalletBasedReordering,
    queue: ProposalQueue,
}

impl IntersectionSimulator {
    pub fn new(grid_config: ReservationGridConfig, batch_config: BatchConfig, intersection: Intersection, registry: VehicleSpecRegistry) -> Result<Self> {
        batch_config.validate()?;

        let mut reordering = WalletBasedReordering::new(batch_config, &intersection);
        let manager = ReservationGridManager::new(grid_config, intersection, &registry)?;
        reordering.set_initial_time(manager.current_time());

        return Ok(IntersectionSimulator { registry, manager, reordering, queue: ProposalQueue::new() });
    }

    pub fn from_scenario(dto: ScenarioDto) -> Result<Self> {
        return Self::from_scenario_with_rng(dto, &mut rand::rng());
    }

    /// Builds the simulator and enqueues the scenario's proposals. Proposals without a
    /// bid get one from a random [`Wallet`] drawn from `rng`.
    pub fn from_scenario_with_rng<R: Rng + ?Sized>(dto: ScenarioDto, rng: &mut R) -> Result<Self> {
        let grid_config = ReservationGridConfig::from_dto(&dto.reservation_grid)?;
        let batch_config = BatchConfig::from_dto(&dto.batch)?;
        let intersection = Intersection::from_dto(&dto.intersection)?;
        let registry = VehicleSpecRegistry::from_dtos(&dto.vehicle_specs)?;

        let mut simulator = IntersectionSimulator::new(grid_config, batch_config, intersection, registry)?;

        for proposal_dto in &dto.proposals {
            let proposal = proposal_from_dto(proposal_dto, rng);
            simulator.submit(proposal)?;
        }

        log::info!("Scenario loaded with {} pending proposals.", simulator.queue.len());

        return Ok(simulator);
    }

    /// Enqueues `proposal` for the next batches and returns its submission index.
    ///
    /// # Returns
    /// [`Error::UnknownLane`] or [`Error::UnknownVehicleSpec`] if the proposal does not
    /// fit this intersection, [`Error::InvalidProposal`] if its arrival time lies
    /// outside the grid or its arrival velocity is not a finite non-negative number.
    pub fn submit(&mut self, proposal: Proposal) -> Result<u64> {
        if !self.manager.grid().is_representable(proposal.arrival_time) {
            return Err(Error::InvalidProposal(format!("{:?} arrival time {} is outside the grid", proposal.vin, proposal.arrival_time)));
        }

        if !(proposal.arrival_velocity >= 0.0) || !proposal.arrival_velocity.is_finite() {
            return Err(Error::InvalidProposal(format!("{:?} arrival velocity must be finite and non-negative, got {}", proposal.vin, proposal.arrival_velocity)));
        }

        for lane in [proposal.arrival_lane, proposal.departure_lane] {
            if self.manager.intersection().lane(lane).is_none() {
                return Err(Error::UnknownLane(lane));
            }
        }

        if self.registry.get_by_name(&proposal.vehicle_spec).is_none() {
            return Err(Error::UnknownVehicleSpec(proposal.vehicle_spec));
        }

        log::debug!("{:?} proposes arrival at {:.3} on lane {} with bid {:.2}.", proposal.vin, proposal.arrival_time, proposal.arrival_lane, proposal.bid);

        return Ok(self.queue.push(proposal));
    }

    /// Releases the reservation of `vin`.
    pub fn cancel(&mut self, vin: Vin) {
        self.manager.cancel(vin);
    }

    /// Advances the simulation by `delta`.
    ///
    /// Proposals whose arrival time has passed are dropped first. When the next
    /// processing time is reached, the batch is queried and accepted in bid order.
    /// Finally the manager purges old reservations and advances its clock.
    pub fn tick(&mut self, delta: f64) -> TickReport {
        let current_time = self.manager.current_time();
        let mut report = TickReport { time: current_time, ..TickReport::default() };

        for expired in self.queue.remove_expired(current_time) {
            log::debug!("Proposal of {:?} expired at {:.3}.", expired.proposal.vin, current_time);
            report.expired.push(expired.proposal.vin);
        }

        if current_time >= self.reordering.next_processing_time() {
            let batch = self.reordering.get_batch(current_time, &self.queue);

            for indexed in batch {
                let Some(spec) = self.registry.get_by_name(&indexed.proposal.vehicle_spec) else {
                    log::error!("{:?} references unregistered vehicle spec '{}'.", indexed.proposal.vin, indexed.proposal.vehicle_spec);
                    report.rejected.push(indexed.proposal.vin);
                    continue;
                };

                let proposal = &indexed.proposal;
                let query = Query::new(
                    proposal.vin,
                    proposal.arrival_time,
                    proposal.arrival_velocity,
                    proposal.arrival_lane,
                    proposal.departure_lane,
                    spec.clone(),
                    spec.max_velocity,
                    proposal.accelerating,
                );

                match self.manager.query(&query, false) {
                    Some(plan) => {
                        let vin = self.manager.accept(&plan);
                        self.queue.remove(&indexed);
                        report.confirmed.push(vin);
                    }
                    None => report.rejected.push(proposal.vin),
                }
            }

            log::info!(
                "Tick {:.2}: {} confirmed, {} rejected, {} still pending.",
                current_time,
                report.confirmed.len(),
                report.rejected.len(),
                self.queue.len()
            );
        }

        self.manager.act(delta);

        return report;
    }

    pub fn manager(&self) -> &ReservationGridManager {
        &self.manager
    }

    pub fn reordering(&self) -> &WalletBasedReordering {
        &self.reordering
    }

    pub fn queue(&self) -> &ProposalQueue {
        &self.queue
    }

    pub fn registry(&self) -> &VehicleSpecRegistry {
        &self.registry
    }

    pub fn current_time(&self) -> f64 {
        self.manager.current_time()
    }

    /// Default tick length of the scenario.
    pub fn time_step(&self) -> f64 {
        self.manager.config().time_step
    }
}

fn proposal_from_dto<R: Rng + ?Sized>(dto: &ProposalDto, rng: &mut R) -> Proposal {
    let bid = dto.bid.unwrap_or_else(|| Wallet::random(rng).current_bid());

    Proposal {
        vin: Vin::new(dto.vin),
        vehicle_spec: dto.vehicle_spec.clone(),
        arrival_lane: LaneId::new(dto.arrival_lane),
        departure_lane: LaneId::new(dto.departure_lane),
        arrival_time: dto.arrival_time,
        arrival_velocity: dto.arrival_velocity,
        accelerating: dto.accelerating,
        bid,
    }
}
