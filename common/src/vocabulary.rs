//! 固定語彙
//!
//! 是正前/是正後の判定キーワード、埋め込み分類の候補フレーズ、
//! 輝度・コントラストによる簡易分類のタグクラスタ。

/// 是正前を示すキーワード
pub const BEFORE_KEYWORDS: &[&str] = &[
    "before",
    "messy",
    "dirty",
    "unsafe",
    "hazard",
    "violation",
    "disorganized",
    "cluttered",
    "dangerous",
    "risky",
    "precarious",
    "unstable",
    "insecure",
    "unprotected",
    "unguarded",
    "unshielded",
];

/// 是正後を示すキーワード
pub const AFTER_KEYWORDS: &[&str] = &[
    "after",
    "clean",
    "tidy",
    "safe",
    "organized",
    "neat",
    "secure",
    "stable",
    "protected",
    "guarded",
    "shielded",
    "improvement",
];

// ============================================
// 簡易分類のタグクラスタ
// ============================================

/// 明るい画像（是正後寄り）
pub const BRIGHT_CLUSTER: &[&str] = &[
    "clean workplace",
    "organized workplace",
    "after improvement",
    "safe condition",
    "after cleaning",
    "after fixing",
    "workplace safety",
];

/// 暗い画像（是正前寄り）
pub const DARK_CLUSTER: &[&str] = &[
    "messy workplace",
    "safety hazard",
    "before improvement",
    "unsafe condition",
    "before cleaning",
    "before fixing",
    "safety violation",
];

/// 高コントラスト（詳細・設備）
pub const DETAILED_CLUSTER: &[&str] = &[
    "detailed view",
    "clear image",
    "construction site",
    "safety equipment",
];

/// 低コントラスト（均一・単純）
pub const UNIFORM_CLUSTER: &[&str] = &[
    "uniform scene",
    "simple view",
    "workplace environment",
    "safety area",
];

/// 常に付与する汎用タグ
pub const GENERAL_TAGS: &[&str] = &["construction safety", "workplace inspection"];

// ============================================
// 埋め込み分類の候補フレーズ
// ============================================

/// 画像と比較するフレーズ一覧（安全・状態・前後）
pub const EMBEDDING_VOCABULARY: &[&str] = &[
    "construction site",
    "safety hazard",
    "workplace safety",
    "construction safety",
    "safety violation",
    "safety equipment",
    "protective gear",
    "hard hat",
    "safety vest",
    "safety goggles",
    "safety gloves",
    "safety boots",
    "safety harness",
    "safety sign",
    "warning sign",
    "danger sign",
    "caution sign",
    "safety barrier",
    "safety fence",
    "safety net",
    "safety tape",
    "safety cone",
    "safety ladder",
    "safety scaffold",
    "safety platform",
    "safety rail",
    "safety guard",
    "safety cover",
    "safety lock",
    "safety switch",
    "safety valve",
    "safety sensor",
    "safety alarm",
    "safety light",
    "safety camera",
    "safety monitor",
    "safety inspection",
    "safety audit",
    "safety training",
    "safety meeting",
    "safety briefing",
    "safety plan",
    "safety policy",
    "safety procedure",
    "safety protocol",
    "safety standard",
    "safety regulation",
    "safety requirement",
    "safety guideline",
    "safety manual",
    "safety handbook",
    "safety report",
    "safety record",
    "safety certificate",
    "safety certification",
    "safety compliance",
    "safety incident",
    "safety accident",
    "safety injury",
    "safety fatality",
    "safety near miss",
    "safety risk",
    "safety danger",
    "safety threat",
    "safety emergency",
    "safety crisis",
    "safety disaster",
    "safety catastrophe",
    "clean workplace",
    "organized workplace",
    "tidy workplace",
    "neat workplace",
    "messy workplace",
    "disorganized workplace",
    "cluttered workplace",
    "dirty workplace",
    "unsafe condition",
    "safe condition",
    "hazardous condition",
    "dangerous condition",
    "risky condition",
    "precarious condition",
    "unstable condition",
    "stable condition",
    "secure condition",
    "insecure condition",
    "protected condition",
    "unprotected condition",
    "guarded condition",
    "unguarded condition",
    "shielded condition",
    "unshielded condition",
    "before repair",
    "after repair",
    "before maintenance",
    "after maintenance",
    "before cleaning",
    "after cleaning",
    "before organizing",
    "after organizing",
    "before fixing",
    "after fixing",
    "before improvement",
    "after improvement",
    "before renovation",
    "after renovation",
    "before restoration",
    "after restoration",
    "before upgrade",
    "after upgrade",
    "before update",
    "after update",
    "before modification",
    "after modification",
    "before alteration",
    "after alteration",
    "before transformation",
    "after transformation",
    "before conversion",
    "after conversion",
    "before change",
    "after change",
    "before adjustment",
    "after adjustment",
    "before correction",
    "after correction",
    "before rectification",
    "after rectification",
    "before remediation",
    "after remediation",
    "before treatment",
    "after treatment",
];
