//! 内置解封装器.

pub mod pnm;
pub mod wav;
pub mod y4m;

use crate::format_id::FormatId;
use crate::registry::FormatRegistry;

/// 注册所有内置解封装器与探测器
pub fn register_all_demuxers(registry: &mut FormatRegistry) {
    registry.register_demuxer(FormatId::Wav, wav::WavDemuxer::create);
    registry.register_probe(Box::new(wav::WavProbe));

    registry.register_demuxer(FormatId::Y4m, y4m::Y4mDemuxer::create);
    registry.register_probe(Box::new(y4m::Y4mProbe));

    registry.register_demuxer(FormatId::Pnm, pnm::PnmDemuxer::create);
    registry.register_probe(Box::new(pnm::PnmProbe));
}
