use clap::ValueEnum;
use codesplit_chunker::{ChunkPolicy, FallbackMode, OutputFormat, OverflowStrategy, SizeUnit};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum UnitFlag {
    Lines,
    Bytes,
}

impl UnitFlag {
    pub(crate) const fn as_domain(self) -> SizeUnit {
        match self {
            UnitFlag::Lines => SizeUnit::Lines,
            UnitFlag::Bytes => SizeUnit::Bytes,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum OverflowFlag {
    PreserveAtomic,
    SplitNested,
    ForceSplit,
    Reject,
}

impl OverflowFlag {
    pub(crate) const fn as_domain(self) -> OverflowStrategy {
        match self {
            OverflowFlag::PreserveAtomic => OverflowStrategy::PreserveAtomic,
            OverflowFlag::SplitNested => OverflowStrategy::SplitNested,
            OverflowFlag::ForceSplit => OverflowStrategy::ForceSplit,
            OverflowFlag::Reject => OverflowStrategy::Reject,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum FallbackFlag {
    None,
    WholeFile,
    Heuristic,
}

impl FallbackFlag {
    pub(crate) const fn as_domain(self) -> FallbackMode {
        match self {
            FallbackFlag::None => FallbackMode::None,
            FallbackFlag::WholeFile => FallbackMode::WholeFile,
            FallbackFlag::Heuristic => FallbackMode::Heuristic,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum FormatFlag {
    #[default]
    Json,
    Jsonl,
}

impl FormatFlag {
    pub(crate) const fn as_domain(self) -> OutputFormat {
        match self {
            FormatFlag::Json => OutputFormat::Json,
            FormatFlag::Jsonl => OutputFormat::JsonLines,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum PresetFlag {
    #[default]
    Default,
    Embeddings,
    LlmContext,
}

impl PresetFlag {
    pub(crate) fn as_domain(self) -> ChunkPolicy {
        match self {
            PresetFlag::Default => ChunkPolicy::default(),
            PresetFlag::Embeddings => ChunkPolicy::for_embeddings(),
            PresetFlag::LlmContext => ChunkPolicy::for_llm_context(),
        }
    }
}
