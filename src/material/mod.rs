//! Material capability set (§1, §6): the integrator only ever sees a
//! `Bsdf` built by `compute_scattering_functions`. Concrete materials below
//! are just enough capability to exercise every BxDF lobe end-to-end; full
//! shader-graph materials are the out-of-scope collaborator.

use bumpalo::Bump;

use crate::interaction::SurfaceInteraction;
use crate::reflection::bsdf::Bsdf;

pub mod glass;
pub mod matte;
pub mod mirror;

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum TransportMode {
    Radiance,
    Importance,
}

pub trait Material: Sync + Send {
    fn compute_scattering_functions<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        mode: TransportMode,
        allow_multiple_lobes: bool,
    ) -> Bsdf<'a>;
}