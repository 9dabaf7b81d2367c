mod resource_sampler;

pub use resource_sampler::ResourceSampler;
