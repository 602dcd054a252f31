//! Built-in disease table.
//!
//! Entry order is match precedence: the first entry with a keyword found in
//! a lowercased label wins. Specific keywords sit before the generic family
//! keyword they contain.

use super::{DiseaseKnowledgeEntry, StaticTreatment};

pub(super) static BLIGHT: StaticTreatment = StaticTreatment {
    organic: &[
        "Remove all infected leaves immediately",
        "Apply neem oil spray (5ml/L water)",
        "Use copper-based organic fungicide (2g/L) every 7 days",
        "Apply baking soda solution (1 tbsp/gallon)",
    ],
    chemical: &[
        "Apply Mancozeb (2.5g/L) or Chlorothalonil (2ml/L) fungicide",
        "Use systemic fungicide such as Metalaxyl for severe cases",
        "Rotate fungicide groups to prevent resistance",
    ],
    prevention: &[
        "Water at soil level and avoid wetting foliage",
        "Mulch around plants to prevent soil splash",
        "Keep 45cm spacing between plants",
    ],
    immediate_actions: &[
        "Remove infected parts now",
        "Burn or bag infected material, do not compost it",
        "Stop overhead watering",
    ],
};

pub(super) static MILDEW: StaticTreatment = StaticTreatment {
    organic: &[
        "Spray with milk solution (40% milk, 60% water)",
        "Apply sulfur-based organic fungicide",
        "Use potassium bicarbonate spray (5g/L)",
        "Neem oil application every 7 days",
    ],
    chemical: &[
        "Apply trifloxystrobin or myclobutanil",
        "Use a preventive fungicide program in humid weather",
        "Systemic fungicides for severe infection",
    ],
    prevention: &[
        "Improve air circulation by pruning dense growth",
        "Avoid excess nitrogen fertilizer",
        "Plant in full sun where possible",
    ],
    immediate_actions: &[
        "Prune affected areas",
        "Improve air circulation",
        "Increase sunlight exposure",
    ],
};

pub(super) static RUST: StaticTreatment = StaticTreatment {
    organic: &[
        "Remove infected leaves promptly",
        "Apply sulfur dust or spray",
        "Use compost tea as a foliar spray",
        "Neem oil application every 7-10 days",
    ],
    chemical: &[
        "Apply propiconazole or tebuconazole",
        "Use azoxystrobin on a preventive schedule",
        "Rotate with different fungicide groups",
    ],
    prevention: &[
        "Plant rust-resistant varieties",
        "Remove fallen leaves and crop debris",
        "Avoid overhead irrigation",
    ],
    immediate_actions: &[
        "Remove fallen leaves",
        "Ensure good air flow",
        "Water at soil level only",
    ],
};

pub(super) static SPOT: StaticTreatment = StaticTreatment {
    organic: &[
        "Copper hydroxide spray (2g/L)",
        "Remove infected plant debris",
        "Apply compost tea weekly",
        "Use bacterial antagonists (Bacillus subtilis)",
    ],
    chemical: &[
        "Copper-based bactericides",
        "Streptomycin where permitted",
        "Apply protective sprays before rain",
    ],
    prevention: &[
        "Use certified disease-free seed",
        "Avoid working with plants while they are wet",
        "Disinfect tools between plants",
    ],
    immediate_actions: &[
        "Stop overhead irrigation",
        "Sanitize all tools",
        "Remove heavily infected plants",
    ],
};

pub(super) static WILT: StaticTreatment = StaticTreatment {
    organic: &[
        "Uproot and destroy wilted plants",
        "Drench soil with Trichoderma-enriched compost",
        "Solarize affected beds with clear plastic for 4-6 weeks",
    ],
    chemical: &[
        "Soil drench with carbendazim (1g/L) around healthy plants",
        "Consult local extension service on soil fumigation",
    ],
    prevention: &[
        "Use wilt-resistant or grafted varieties",
        "Practice a 3-4 year crop rotation",
        "Improve soil drainage",
    ],
    immediate_actions: &[
        "Isolate wilting plants",
        "Avoid moving soil from affected areas",
        "Check roots for discoloration",
    ],
};

pub(super) static ROT: StaticTreatment = StaticTreatment {
    organic: &[
        "Remove rotting tissue and affected plants",
        "Let soil dry out between waterings",
        "Apply Trichoderma or Bacillus biofungicide to the root zone",
        "Prune mummified fruit and infected canes",
    ],
    chemical: &[
        "Apply fosetyl-aluminium or metalaxyl soil drench for root rot",
        "Use myclobutanil or captan for fruit rots",
        "Follow label intervals strictly",
    ],
    prevention: &[
        "Improve drainage and avoid waterlogging",
        "Do not overwater",
        "Remove plant debris at season end",
    ],
    immediate_actions: &[
        "Reduce watering immediately",
        "Remove rotting material",
        "Check drainage holes and beds",
    ],
};

pub(super) static VIRUS: StaticTreatment = StaticTreatment {
    organic: &[
        "Remove and destroy infected plants",
        "Control insect vectors (whiteflies, aphids)",
        "Use reflective mulches",
        "Apply neem oil for vector control",
    ],
    chemical: &[
        "No cure exists - focus on vector control",
        "Insecticides for whitefly and aphid control",
        "Imidacloprid for systemic protection",
    ],
    prevention: &[
        "Plant virus-resistant varieties",
        "Use yellow sticky traps to monitor vectors",
        "Remove weeds that host vectors",
    ],
    immediate_actions: &[
        "Isolate infected plants",
        "Control insect vectors immediately",
        "Wash hands and tools after handling",
    ],
};

pub(super) static GENERIC: StaticTreatment = StaticTreatment {
    organic: &[
        "Remove affected plant parts",
        "Apply neem oil (5ml/L) every 5-7 days",
        "Improve plant nutrition with compost",
        "Use organic mulch to prevent splash",
    ],
    chemical: &[
        "Identify the specific pathogen for targeted treatment",
        "Apply a broad-spectrum fungicide if the cause is fungal",
        "Consult your local agricultural extension",
    ],
    prevention: &[],
    immediate_actions: &[
        "Document symptoms with photos",
        "Monitor plants daily",
        "Consult a local expert",
    ],
};

pub(super) static HEALTHY: StaticTreatment = StaticTreatment {
    organic: &[
        "Continue regular watering schedule",
        "Apply organic compost monthly",
        "Monitor for any changes",
        "Maintain good air circulation",
    ],
    chemical: &[
        "No chemical treatment needed",
        "Optional: apply balanced NPK fertilizer",
    ],
    prevention: &[
        "Regular inspection for early detection",
        "Maintain proper plant spacing",
        "Remove dead leaves promptly",
        "Use disease-resistant varieties",
    ],
    immediate_actions: &[],
};

/// Appended to every diseased plan from the static table.
pub(super) static COMMON_PREVENTION: &[&str] = &[
    "Use disease-resistant varieties",
    "Practice crop rotation",
    "Maintain proper plant spacing",
    "Ensure good drainage",
    "Regular field sanitation",
];

pub(super) static HEALTHY_ENTRY: DiseaseKnowledgeEntry = DiseaseKnowledgeEntry {
    token: "healthy",
    name: "Healthy Plant",
    pathogen: None,
    keywords: &[],
    symptoms: &["No visible disease symptoms", "Normal growth", "Good color"],
    treatment: &HEALTHY,
};

pub(super) static ENTRIES: &[DiseaseKnowledgeEntry] = &[
    DiseaseKnowledgeEntry {
        token: "early_blight",
        name: "Early Blight",
        pathogen: Some("Alternaria solani"),
        keywords: &["early blight"],
        symptoms: &[
            "Dark spots with concentric rings",
            "Yellow halos around spots",
            "Lower leaves affected first",
        ],
        treatment: &BLIGHT,
    },
    DiseaseKnowledgeEntry {
        token: "late_blight",
        name: "Late Blight",
        pathogen: Some("Phytophthora infestans"),
        keywords: &["late blight"],
        symptoms: &["Water-soaked spots", "White fuzzy growth", "Rapid plant death"],
        treatment: &BLIGHT,
    },
    DiseaseKnowledgeEntry {
        token: "blight",
        name: "Blight",
        pathogen: None,
        keywords: &["blight"],
        symptoms: &["Brown or black lesions", "Yellowing leaves", "Leaf collapse"],
        treatment: &BLIGHT,
    },
    DiseaseKnowledgeEntry {
        token: "powdery_mildew",
        name: "Powdery Mildew",
        pathogen: Some("Erysiphe spp."),
        keywords: &["powdery mildew", "powdery"],
        symptoms: &["White powdery coating", "Leaf curling", "Stunted growth"],
        treatment: &MILDEW,
    },
    DiseaseKnowledgeEntry {
        token: "downy_mildew",
        name: "Downy Mildew",
        pathogen: Some("Peronosporaceae"),
        keywords: &["downy mildew"],
        symptoms: &[
            "Yellow angular patches on upper leaf",
            "Grey-purple growth underneath",
        ],
        treatment: &MILDEW,
    },
    DiseaseKnowledgeEntry {
        token: "mildew",
        name: "Mildew",
        pathogen: None,
        keywords: &["mildew"],
        symptoms: &["White or grey fungal growth", "Distorted leaves"],
        treatment: &MILDEW,
    },
    DiseaseKnowledgeEntry {
        token: "rust",
        name: "Rust",
        pathogen: Some("Puccinia spp."),
        keywords: &["rust"],
        symptoms: &[
            "Orange or rust colored pustules",
            "Yellowing leaves",
            "Premature leaf drop",
        ],
        treatment: &RUST,
    },
    DiseaseKnowledgeEntry {
        token: "bacterial_spot",
        name: "Bacterial Spot",
        pathogen: Some("Xanthomonas spp."),
        keywords: &["bacterial spot"],
        symptoms: &["Dark water-soaked spots", "Yellow halos", "Leaf drop"],
        treatment: &SPOT,
    },
    DiseaseKnowledgeEntry {
        token: "leaf_spot",
        name: "Leaf Spot",
        pathogen: None,
        keywords: &["leaf spot", "spot"],
        symptoms: &["Circular brown spots", "Spots merging into patches"],
        treatment: &SPOT,
    },
    DiseaseKnowledgeEntry {
        token: "wilt",
        name: "Wilt",
        pathogen: Some("Fusarium or Verticillium spp."),
        keywords: &["wilt"],
        symptoms: &["Drooping leaves", "Yellowing on one side", "Brown vascular tissue"],
        treatment: &WILT,
    },
    DiseaseKnowledgeEntry {
        token: "root_rot",
        name: "Root Rot",
        pathogen: Some("Pythium or Phytophthora spp."),
        keywords: &["root rot"],
        symptoms: &["Brown mushy roots", "Wilting despite moist soil", "Stunted growth"],
        treatment: &ROT,
    },
    DiseaseKnowledgeEntry {
        token: "rot",
        name: "Rot",
        pathogen: None,
        keywords: &["rot"],
        symptoms: &["Soft decaying tissue", "Dark sunken lesions"],
        treatment: &ROT,
    },
    DiseaseKnowledgeEntry {
        token: "mosaic",
        name: "Mosaic Virus",
        pathogen: Some("Tobamovirus / Potyvirus"),
        keywords: &["mosaic"],
        symptoms: &["Mottled light and dark green", "Leaf distortion", "Stunted growth"],
        treatment: &VIRUS,
    },
    DiseaseKnowledgeEntry {
        token: "leaf_curl",
        name: "Leaf Curl Virus",
        pathogen: Some("Begomovirus"),
        keywords: &["leaf curl", "curl virus"],
        symptoms: &["Upward leaf curling", "Leaf thickening", "Yellowing"],
        treatment: &VIRUS,
    },
];
