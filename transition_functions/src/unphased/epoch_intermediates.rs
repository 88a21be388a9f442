use types::phase0::primitives::Gwei;

pub trait EpochDeltas: Copy {
    fn combined_reward(self) -> Gwei;
    fn combined_penalty(self) -> Gwei;
}
