//! Conversation-title heuristic.
//!
//! Derives a human-readable label, category, and detected body region
//! from the first message of a conversation. Pure and deterministic:
//! tie-breaks are fixed (table scan order, emergency override,
//! first-phrase-wins, first-body-part-wins) so identical input always
//! yields an identical title.

/// One row of the category table: a keyword set, an icon glyph, and a
/// style tag for the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub icon: &'static str,
    pub style: &'static str,
}

const EMERGENCY: Category = Category {
    name: "EMERGENCY",
    keywords: &["emergency", "urgent", "severe", "extreme", "critical", "immediate"],
    icon: "🚨",
    style: "emergency",
};

const CONSULTATION: Category = Category {
    name: "CONSULTATION",
    keywords: &["advice", "question", "consult", "opinion", "guidance"],
    icon: "👨‍⚕️",
    style: "consultation",
};

/// Scan order matters: the first matching row becomes the main
/// category, except EMERGENCY which always wins.
pub static HEALTH_CATEGORIES: [Category; 8] = [
    EMERGENCY,
    Category {
        name: "CHRONIC",
        keywords: &["diabetes", "arthritis", "asthma", "hypertension", "chronic"],
        icon: "⚕️",
        style: "chronic",
    },
    Category {
        name: "MENTAL_HEALTH",
        keywords: &["anxiety", "depression", "stress", "mental", "mood", "sleep"],
        icon: "🧠",
        style: "mental",
    },
    Category {
        name: "LIFESTYLE",
        keywords: &["diet", "exercise", "nutrition", "fitness", "weight", "lifestyle"],
        icon: "🌱",
        style: "lifestyle",
    },
    Category {
        name: "FOLLOWUP",
        keywords: &["follow", "checkup", "review", "progress", "monitoring"],
        icon: "📋",
        style: "followup",
    },
    Category {
        name: "MEDICATION",
        keywords: &["medicine", "drug", "prescription", "dosage", "medication"],
        icon: "💊",
        style: "medication",
    },
    Category {
        name: "SYMPTOMS",
        keywords: &["pain", "fever", "cough", "headache", "nausea", "symptoms"],
        icon: "🔍",
        style: "symptoms",
    },
    CONSULTATION,
];

/// Body regions, scanned in order; detection stops at the first match.
static BODY_PARTS: [(&str, &[&str]); 6] = [
    ("head", &["head", "brain", "skull", "face"]),
    ("chest", &["chest", "heart", "lung", "breast"]),
    ("abdomen", &["stomach", "abdomen", "digestive"]),
    ("limbs", &["arm", "leg", "hand", "foot"]),
    ("joints", &["joint", "knee", "elbow", "shoulder"]),
    ("skin", &["skin", "rash", "dermis"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub title: String,
    pub category: &'static str,
    pub style: &'static str,
    pub sub_categories: Vec<&'static str>,
    pub body_part: Option<&'static str>,
}

fn matches(lowered: &str, category: &Category) -> bool {
    category.keywords.iter().any(|kw| lowered.contains(kw))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First pair of adjacent words where both exceed 3 characters,
/// title-cased. This is the "key phrase" shown in the title.
fn key_phrase(words: &[&str]) -> Option<String> {
    words.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        if a.chars().count() > 3 && b.chars().count() > 3 {
            Some(format!("{} {}", capitalize(a), capitalize(b)))
        } else {
            None
        }
    })
}

pub fn classify(message: &str) -> Classification {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered.split(' ').collect();

    // Keyword hits are substring matches on the lowered message, not
    // token matches; only the key phrase works on whole words.
    let mut main: Option<&Category> = None;
    let mut subs: Vec<&Category> = Vec::new();
    for category in &HEALTH_CATEGORIES {
        if !matches(&lowered, category) {
            continue;
        }
        if main.is_none() || category.name == EMERGENCY.name {
            // Emergency replaces an earlier main outright; the
            // displaced category is dropped, not demoted.
            main = Some(category);
        } else {
            subs.push(category);
        }
    }
    let main = main.unwrap_or(&CONSULTATION);

    let body_part = BODY_PARTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(part, _)| *part);

    let mut title = format!("{} ", main.icon);
    if let Some(part) = body_part {
        title.push_str(&capitalize(part));
        title.push_str(" • ");
    }
    if let Some(phrase) = key_phrase(&words) {
        title.push_str(&phrase);
        title.push(' ');
    }
    if !subs.is_empty() {
        let icons: Vec<&str> = subs.iter().take(2).map(|c| c.icon).collect();
        title.push_str(&icons.join(" "));
    }
    if main.name == EMERGENCY.name {
        title = format!("🚨 URGENT: {title}");
    }

    Classification {
        title: title.trim().to_string(),
        category: main.name,
        style: main.style,
        sub_categories: subs.iter().map(|c| c.name).collect(),
        body_part,
    }
}
