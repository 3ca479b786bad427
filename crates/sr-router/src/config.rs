//! Default routing configuration with multilingual keywords (EN, ZH, JP, RU, DE).

use crate::types::*;
use sr_core::Tier;
use std::collections::BTreeMap;

fn s(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn weights() -> BTreeMap<String, f64> {
    [
        (Dimension::TokenCount, 0.08),
        (Dimension::CodePresence, 0.15),
        (Dimension::ReasoningMarkers, 0.18),
        (Dimension::TechnicalTerms, 0.10),
        (Dimension::CreativeMarkers, 0.05),
        (Dimension::SimpleIndicators, 0.02),
        (Dimension::MultiStepPatterns, 0.12),
        (Dimension::QuestionComplexity, 0.05),
        (Dimension::ImperativeVerbs, 0.03),
        (Dimension::ConstraintCount, 0.04),
        (Dimension::OutputFormat, 0.03),
        (Dimension::ReferenceComplexity, 0.02),
        (Dimension::NegationComplexity, 0.01),
        (Dimension::DomainSpecificity, 0.02),
        (Dimension::AgenticTask, 0.04),
    ]
    .into_iter()
    .map(|(d, w)| (d.as_str().to_string(), w))
    .collect()
}

fn pref_map(entries: &[(Tier, &[&str], &[&str])]) -> TierPreferences {
    entries
        .iter()
        .map(|(tier, models, caps)| {
            (*tier, TierPreference {
                preferred_models: s(models),
                capabilities: caps.iter().map(|c| (c.to_string(), true)).collect(),
            })
        })
        .collect()
}

/// Default scoring config.
pub fn default_scoring_config() -> ScoringConfig {
    ScoringConfig {
        token_count_thresholds: TokenThresholds { simple: 50, complex: 500 },
        code_keywords: s(&[
            "function", "class", "import", "def", "select", "async", "await",
            "const", "let", "var", "return", "```",
            "函数", "类", "导入", "定义", "查询", "异步", "等待", "常量", "变量", "返回",
            "関数", "クラス", "インポート", "非同期", "定数", "変数",
            "функция", "класс", "импорт", "определ", "запрос", "асинхронный",
            "ожидать", "константа", "переменная", "вернуть",
            "funktion", "klasse", "importieren", "definieren", "abfrage",
            "asynchron", "erwarten", "konstante", "variable", "zurückgeben",
        ]),
        reasoning_keywords: s(&[
            "prove", "theorem", "derive", "step by step", "chain of thought",
            "formally", "mathematical", "proof", "logically",
            "证明", "定理", "推导", "逐步", "思维链", "形式化", "数学", "逻辑",
            "証明", "定理", "導出", "ステップバイステップ", "論理的",
            "доказать", "докажи", "доказательств", "теорема", "вывести",
            "шаг за шагом", "пошагово", "поэтапно", "цепочка рассуждений",
            "рассуждени", "формально", "математически", "логически",
            "beweisen", "beweis", "theorem", "ableiten", "schritt für schritt",
            "gedankenkette", "formal", "mathematisch", "logisch",
        ]),
        simple_keywords: s(&[
            "what is", "define", "translate", "hello", "yes or no", "capital of",
            "how old", "who is", "when was",
            "什么是", "定义", "翻译", "你好", "是否", "首都", "多大", "谁是", "何时",
            "とは", "定義", "翻訳", "こんにちは", "はいかいいえ", "首都", "誰",
            "что такое", "определение", "перевести", "переведи", "привет",
            "да или нет", "столица", "сколько лет", "кто такой", "когда", "объясни",
            "was ist", "definiere", "übersetze", "hallo", "ja oder nein",
            "hauptstadt", "wie alt", "wer ist", "wann", "erkläre",
        ]),
        technical_keywords: s(&[
            "algorithm", "optimize", "architecture", "distributed", "kubernetes",
            "microservice", "database", "infrastructure",
            "算法", "优化", "架构", "分布式", "微服务", "数据库", "基础设施",
            "アルゴリズム", "最適化", "アーキテクチャ", "分散", "マイクロサービス", "データベース",
            "алгоритм", "оптимизировать", "оптимизаци", "оптимизируй", "архитектура",
            "распределённый", "микросервис", "база данных", "инфраструктура",
            "algorithmus", "optimieren", "architektur", "verteilt", "kubernetes",
            "mikroservice", "datenbank", "infrastruktur",
        ]),
        creative_keywords: s(&[
            "story", "poem", "compose", "brainstorm", "creative", "imagine", "write a",
            "故事", "诗", "创作", "头脑风暴", "创意", "想象", "写一个",
            "物語", "詩", "作曲", "ブレインストーム", "創造的", "想像",
            "история", "рассказ", "стихотворение", "сочинить", "сочини",
            "мозговой штурм", "творческий", "представить", "придумай", "напиши",
            "geschichte", "gedicht", "komponieren", "brainstorming", "kreativ",
            "vorstellen", "schreibe", "erzählung",
        ]),
        imperative_verbs: s(&[
            "build", "create", "implement", "design", "develop", "construct",
            "generate", "deploy", "configure", "set up",
            "构建", "创建", "实现", "设计", "开发", "生成", "部署", "配置", "设置",
            "構築", "作成", "実装", "設計", "開発", "生成", "デプロイ", "設定",
            "построить", "построй", "создать", "создай", "реализовать", "реализуй",
            "спроектировать", "разработать", "разработай", "сконструировать",
            "сгенерировать", "сгенерируй", "развернуть", "разверни", "настроить", "настрой",
            "erstellen", "bauen", "implementieren", "entwerfen", "entwickeln",
            "konstruieren", "generieren", "bereitstellen", "konfigurieren", "einrichten",
        ]),
        constraint_indicators: s(&[
            "under", "at most", "at least", "within", "no more than", "o(",
            "maximum", "minimum", "limit", "budget",
            "不超过", "至少", "最多", "在内", "最大", "最小", "限制", "预算",
            "以下", "最大", "最小", "制限", "予算",
            "не более", "не менее", "как минимум", "в пределах", "максимум",
            "минимум", "ограничение", "бюджет",
            "höchstens", "mindestens", "innerhalb", "nicht mehr als",
            "maximal", "minimal", "grenze", "budget",
        ]),
        output_format_keywords: s(&[
            "json", "yaml", "xml", "table", "csv", "markdown", "schema",
            "format as", "structured",
            "表格", "格式化为", "结构化",
            "テーブル", "フォーマット", "構造化",
            "таблица", "форматировать как", "структурированный",
            "tabelle", "formatieren als", "strukturiert",
        ]),
        reference_keywords: s(&[
            "above", "below", "previous", "following", "the docs", "the api",
            "the code", "earlier", "attached",
            "上面", "下面", "之前", "接下来", "文档", "代码", "附件",
            "上記", "下記", "前の", "次の", "ドキュメント", "コード",
            "выше", "ниже", "предыдущий", "следующий", "документация", "код",
            "ранее", "вложение",
            "oben", "unten", "vorherige", "folgende", "dokumentation", "der code",
            "früher", "anhang",
        ]),
        negation_keywords: s(&[
            "don't", "do not", "avoid", "never", "without", "except", "exclude",
            "no longer",
            "不要", "避免", "从不", "没有", "除了", "排除",
            "しないで", "避ける", "決して", "なしで", "除く",
            "не делай", "не надо", "нельзя", "избегать", "никогда", "без",
            "кроме", "исключить", "больше не",
            "nicht", "vermeide", "niemals", "ohne", "außer", "ausschließen", "nicht mehr",
        ]),
        domain_specific_keywords: s(&[
            "quantum", "fpga", "vlsi", "risc-v", "asic", "photonics", "genomics",
            "proteomics", "topological", "homomorphic", "zero-knowledge", "lattice-based",
            "量子", "光子学", "基因组学", "蛋白质组学", "拓扑", "同态", "零知识", "格密码",
            "量子", "フォトニクス", "ゲノミクス", "トポロジカル",
            "квантовый", "фотоника", "геномика", "протеомика", "топологический",
            "гомоморфный", "с нулевым разглашением", "на основе решёток",
            "quanten", "photonik", "genomik", "proteomik", "topologisch",
            "homomorph", "zero-knowledge", "gitterbasiert",
        ]),
        agentic_task_keywords: s(&[
            "read file", "read the file", "look at", "check the", "open the",
            "edit", "modify", "update the", "change the", "write to", "create file",
            "execute", "deploy", "install", "npm", "pip", "compile",
            "after that", "and also", "once done", "step 1", "step 2",
            "fix", "debug", "until it works", "keep trying", "iterate",
            "make sure", "verify", "confirm",
            "读取文件", "查看", "打开", "编辑", "修改", "更新", "创建",
            "执行", "部署", "安装", "第一步", "第二步", "修复", "调试",
            "直到", "确认", "验证",
        ]),
        dimension_weights: weights(),
        tier_boundaries: TierBoundaries {
            simple_medium: 0.0,
            medium_complex: 0.18,
            complex_reasoning: 0.4,
        },
        confidence_steepness: 12.0,
        confidence_threshold: 0.7,
    }
}

/// Default (non-agentic) tier preferences.
pub fn default_tier_preferences() -> TierPreferences {
    pref_map(&[
        (Tier::Simple, &["gemini-2.5-flash", "deepseek-chat", "gpt-4o-mini"], &[]),
        (Tier::Medium, &["deepseek-chat", "gpt-4o-mini", "gemini-2.5-flash"], &[]),
        (Tier::Complex, &["gemini-2.5-pro", "claude-sonnet-4", "gpt-4o"], &[]),
        (Tier::Reasoning, &["deepseek-reasoner", "o3-mini", "gemini-2.5-pro"], &["reasoning"]),
    ])
}

/// Tier preferences used when the request is agentic.
pub fn default_agentic_preferences() -> TierPreferences {
    pref_map(&[
        (Tier::Simple, &["claude-haiku-4.5", "gpt-4o-mini", "gemini-2.5-flash"], &["tool_call"]),
        (Tier::Medium, &["claude-sonnet-4", "gpt-4o", "gemini-2.5-flash"], &["tool_call"]),
        (Tier::Complex, &["claude-sonnet-4", "claude-opus-4", "gpt-4o"], &["tool_call"]),
        (Tier::Reasoning, &["claude-sonnet-4", "deepseek-reasoner", "gemini-2.5-pro"], &["tool_call"]),
    ])
}

pub fn default_overrides() -> OverridesConfig {
    OverridesConfig {
        max_tokens_force_complex: 100_000,
        structured_output_min_tier: Tier::Medium,
        ambiguous_default_tier: Tier::Medium,
        agentic_mode: false,
    }
}

/// Default routing configuration.
pub fn default_routing_config() -> RouterConfig {
    RouterConfig {
        scoring: default_scoring_config(),
        overrides: default_overrides(),
        tier_preferences: default_tier_preferences(),
        agentic_preferences: default_agentic_preferences(),
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        default_routing_config()
    }
}

/// The default config instance.
pub static ROUTER_CONFIG: std::sync::LazyLock<RouterConfig> = std::sync::LazyLock::new(default_routing_config);
