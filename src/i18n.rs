use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    Fr,
    En,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ar, Language::Fr, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::Fr => "fr",
            Self::En => "en",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ar" => Some(Self::Ar),
            "fr" => Some(Self::Fr),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    pub fn direction(self) -> TextDirection {
        match self {
            Self::Ar => TextDirection::Rtl,
            Self::Fr | Self::En => TextDirection::Ltr,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// A node in a language's translation tree: either a resolved string or a
/// nested group keyed by path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Leaf(String),
    Branch(BTreeMap<String, TranslationNode>),
}

/// Per-language translation trees. Every supported language has a built-in
/// tree; overlays loaded from disk are merged on top, leaf-wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationTable {
    #[serde(flatten)]
    languages: BTreeMap<Language, TranslationNode>,
}

impl TranslationTable {
    /// The dictionaries shipped with the storefront.
    pub fn built_in() -> Self {
        static TABLE: OnceLock<TranslationTable> = OnceLock::new();
        TABLE
            .get_or_init(|| {
                serde_json::from_str(BUILT_IN_JSON).expect("built-in translations are valid json")
            })
            .clone()
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read locale file: {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("parse locale file: {}", path.display()))
    }

    /// Walks `key` split on `.` through the tree for `language`. Returns the
    /// leaf string, or `None` when a segment is missing or lands on a group.
    pub fn lookup(&self, language: Language, key: &str) -> Option<&str> {
        let mut node = self.languages.get(&language)?;
        for segment in key.split('.') {
            let TranslationNode::Branch(children) = node else {
                return None;
            };
            node = children.get(segment)?;
        }
        match node {
            TranslationNode::Leaf(text) => Some(text),
            TranslationNode::Branch(_) => None,
        }
    }

    /// Merges `overlay` on top of this table. Branches merge recursively,
    /// overlay leaves win.
    pub fn merge(&mut self, overlay: TranslationTable) {
        for (language, node) in overlay.languages {
            match self.languages.get_mut(&language) {
                Some(existing) => merge_nodes(existing, node),
                None => {
                    self.languages.insert(language, node);
                }
            }
        }
    }
}

fn merge_nodes(base: &mut TranslationNode, overlay: TranslationNode) {
    match (base, overlay) {
        (TranslationNode::Branch(base_children), TranslationNode::Branch(overlay_children)) => {
            for (key, overlay_child) in overlay_children {
                match base_children.get_mut(&key) {
                    Some(base_child) => merge_nodes(base_child, overlay_child),
                    None => {
                        base_children.insert(key, overlay_child);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Durable storage for the user's language choice.
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<Language>>;
    fn save(&self, language: Language) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LanguagePreference {
    language: Language,
}

#[derive(Debug, Clone)]
pub struct LocalFsPreferenceStore {
    path: PathBuf,
}

impl LocalFsPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for LocalFsPreferenceStore {
    fn load(&self) -> anyhow::Result<Option<Language>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read language preference: {}", self.path.display()));
            }
        };
        let preference: LanguagePreference =
            serde_json::from_slice(&raw).context("parse language preference")?;
        Ok(Some(preference.language))
    }

    fn save(&self, language: Language) -> anyhow::Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", self.path.display()))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create preference dir: {}", parent.display()))?;

        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        let data = serde_json::to_vec_pretty(&LanguagePreference { language })
            .context("serialize language preference")?;
        std::fs::write(&tmp_path, &data)
            .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("rename tmp to final: {}", self.path.display()))?;
        Ok(())
    }
}

/// The language the session starts in: a persisted choice wins, then the
/// environment-reported language when supported, then the configured default.
pub fn initial_language(
    store: Option<&dyn PreferenceStore>,
    environment: Option<&str>,
    default: Language,
) -> Language {
    if let Some(store) = store {
        match store.load() {
            Ok(Some(language)) => return language,
            Ok(None) => {}
            Err(err) => tracing::warn!(?err, "failed to load language preference"),
        }
    }
    if let Some(raw) = environment
        && let Some(language) = Language::parse(raw)
    {
        return language;
    }
    default
}

/// Two-letter language reported by the environment (`LC_ALL`/`LANG`),
/// e.g. `fr_FR.UTF-8` reports `fr`.
pub fn environment_language() -> Option<String> {
    for var in ["LC_ALL", "LANG"] {
        let Ok(raw) = std::env::var(var) else {
            continue;
        };
        let code = raw
            .split(['_', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !code.is_empty() {
            return Some(code);
        }
    }
    None
}

/// Resolves localized strings for the currently active language and keeps the
/// active choice persisted.
pub struct TranslationResolver {
    table: TranslationTable,
    current: Language,
    store: Option<Box<dyn PreferenceStore>>,
}

impl TranslationResolver {
    pub fn new(
        table: TranslationTable,
        language: Language,
        store: Option<Box<dyn PreferenceStore>>,
    ) -> Self {
        Self {
            table,
            current: language,
            store,
        }
    }

    pub fn current_language(&self) -> Language {
        self.current
    }

    pub fn direction(&self) -> TextDirection {
        self.current.direction()
    }

    pub fn is_rtl(&self) -> bool {
        self.direction() == TextDirection::Rtl
    }

    /// Switches the active language and persists the choice. A persistence
    /// failure is logged, not surfaced: the in-memory switch already happened.
    pub fn set_language(&mut self, language: Language) {
        self.current = language;
        if let Some(store) = &self.store
            && let Err(err) = store.save(language)
        {
            tracing::warn!(?err, language = language.code(), "failed to persist language");
        }
    }

    pub fn translate(&self, key: &str) -> String {
        self.translate_with(key, &[])
    }

    /// Resolves `key` for the current language, substituting every
    /// `{{name}}` occurrence from `params`. Missing keys resolve to the raw
    /// key itself so a gap in a dictionary never breaks rendering.
    pub fn translate_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(resolved) = self.table.lookup(self.current, key) else {
            tracing::warn!(key, language = self.current.code(), "translation key not found");
            return key.to_owned();
        };

        let mut result = resolved.to_owned();
        for (name, value) in params {
            result = result.replace(&format!("{{{{{name}}}}}"), value);
        }
        result
    }

    pub fn format_number(&self, value: Decimal) -> String {
        format_decimal(value, self.current)
    }

    /// Localized amount followed by the localized currency unit.
    pub fn format_currency(&self, amount: Decimal) -> String {
        format!("{} {}", self.format_number(amount), self.translate("mad"))
    }
}

fn format_decimal(value: Decimal, language: Language) -> String {
    let normalized = value.normalize();
    let raw = normalized.abs().to_string();
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (raw.as_str(), None),
    };

    let (group_sep, decimal_sep) = match language {
        Language::En => (',', '.'),
        // Narrow no-break space, the French digit grouping character.
        Language::Fr => ('\u{202f}', ','),
        // Arabic thousands and decimal separators.
        Language::Ar => ('\u{066c}', '\u{066b}'),
    };

    let mut out = String::new();
    if normalized.is_sign_negative() && !normalized.is_zero() {
        out.push('-');
    }
    let digit_count = int_part.len();
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (digit_count - idx) % 3 == 0 {
            out.push(group_sep);
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push(decimal_sep);
        out.push_str(frac);
    }

    if language == Language::Ar {
        out = out
            .chars()
            .map(|ch| match ch {
                '0'..='9' => {
                    char::from_u32(0x0660 + (ch as u32 - '0' as u32)).unwrap_or(ch)
                }
                other => other,
            })
            .collect();
    }
    out
}

static BUILT_IN_JSON: &str = r#"{
  "ar": {
    "home": "الرئيسية",
    "books": "الكتب",
    "offers": "العروض",
    "packs": "الحزم",
    "contact": "اتصل بنا",
    "allBooks": "جميع الكتب",
    "booksSubtitle": "اكتشف مجموعتنا من الكتب واطلب بسهولة",
    "searchPlaceholder": "البحث بالعنوان أو المؤلف أو الوصف...",
    "all": "الكل",
    "price": "السعر (درهم)",
    "minPrice": "الحد الأدنى",
    "maxPrice": "الحد الأقصى",
    "clearFilters": "مسح المرشحات",
    "available": "متوفر",
    "unavailable": "غير متوفر",
    "page": "الصفحة",
    "of": "من",
    "totalBooks": "كتاب إجمالي",
    "previous": "السابق",
    "next": "التالي",
    "booksSelected": "كتاب مختار",
    "orderBooks": "طلب الكتب",
    "finalizeOrder": "إنهاء طلبك",
    "summary": "ملخص",
    "total": "المجموع",
    "firstName": "الاسم الأول",
    "lastName": "الاسم الأخير",
    "email": "البريد الإلكتروني",
    "phone": "رقم الهاتف",
    "address": "عنوان التسليم",
    "city": "المدينة",
    "additionalNotes": "ملاحظات إضافية (اختياري)",
    "cancel": "إلغاء",
    "confirmOrder": "تأكيد الطلب",
    "sending": "جارٍ الإرسال...",
    "orderSuccess": "تم إرسال الطلب بنجاح!",
    "emailConfirmation": "ستتلقى تأكيداً عبر البريد الإلكتروني.",
    "currentOffers": "العروض الحالية",
    "dailyOffers": "العروض اليومية",
    "save": "وفر",
    "expiredOffer": "انتهت الصلاحية",
    "remainingDays": "{{count}} يوم متبقي فقط!",
    "outOfStock": "نفد المخزون",
    "featured": "مميز",
    "thematicPacks": "الحزم الموضوعية",
    "viewPack": "عرض الحزمة",
    "noBooksFound": "لم يتم العثور على كتب",
    "changeSearchCriteria": "حاول تعديل معايير البحث",
    "noOffersAvailable": "لا توجد عروض متاحة في الوقت الحالي",
    "noPacksAvailable": "لا توجد حزم متاحة",
    "loading": "جارٍ التحميل...",
    "loadingBooks": "جارٍ تحميل الكتب...",
    "loadingOffers": "جارٍ تحميل العروض...",
    "loadingPacks": "جارٍ تحميل الحزم...",
    "error": "خطأ",
    "booksLoadError": "خطأ أثناء تحميل الكتب",
    "offersLoadError": "خطأ أثناء تحميل العروض",
    "packsLoadError": "خطأ أثناء تحميل الحزم",
    "orderError": "خطأ أثناء إرسال الطلب",
    "fillAllFields": "يرجى ملء جميع الحقول الإجبارية",
    "selectAtLeastOneBook": "يرجى اختيار كتاب واحد على الأقل",
    "validEmail": "يرجى إدخال عنوان بريد إلكتروني صحيح",
    "minimumSelection": "يرجى اختيار {{count}} كتب على الأقل لإتمام الطلب",
    "mad": "درهم",
    "days": "أيام",
    "inStock": "في المخزون",
    "lowStock": "مخزون منخفض",
    "badge": {
      "new": "جديد",
      "hot": "رائج",
      "sale": "تخفيض",
      "popular": "شائع"
    }
  },
  "fr": {
    "home": "Accueil",
    "books": "Livres",
    "offers": "Offres",
    "packs": "Packs",
    "contact": "Contact",
    "allBooks": "Tous les livres",
    "booksSubtitle": "Découvrez notre sélection de livres et commandez facilement",
    "searchPlaceholder": "Rechercher par titre, auteur ou description...",
    "all": "Tous",
    "price": "Prix (MAD)",
    "minPrice": "Minimum",
    "maxPrice": "Maximum",
    "clearFilters": "Effacer les filtres",
    "available": "Disponible",
    "unavailable": "Indisponible",
    "page": "Page",
    "of": "sur",
    "totalBooks": "livres au total",
    "previous": "Précédent",
    "next": "Suivant",
    "booksSelected": "livre(s) sélectionné(s)",
    "orderBooks": "Commander les livres",
    "finalizeOrder": "Finaliser votre commande",
    "summary": "Récapitulatif",
    "total": "Total",
    "firstName": "Prénom",
    "lastName": "Nom",
    "email": "Email",
    "phone": "Téléphone",
    "address": "Adresse de livraison",
    "city": "Ville",
    "additionalNotes": "Notes supplémentaires (optionnel)",
    "cancel": "Annuler",
    "confirmOrder": "Confirmer la commande",
    "sending": "Envoi en cours...",
    "orderSuccess": "Commande envoyée avec succès !",
    "emailConfirmation": "Vous recevrez une confirmation par email.",
    "currentOffers": "Offres en cours",
    "dailyOffers": "Offres du jour",
    "save": "Économisez",
    "expiredOffer": "Offre expirée",
    "remainingDays": "Plus que {{count}} jours !",
    "outOfStock": "Rupture de stock",
    "featured": "En vedette",
    "thematicPacks": "Packs thématiques",
    "viewPack": "Voir le pack",
    "noBooksFound": "Aucun livre trouvé",
    "changeSearchCriteria": "Essayez de modifier vos critères de recherche",
    "noOffersAvailable": "Aucune offre disponible pour le moment",
    "noPacksAvailable": "Aucun pack disponible",
    "loading": "Chargement...",
    "loadingBooks": "Chargement des livres...",
    "loadingOffers": "Chargement des offres...",
    "loadingPacks": "Chargement des packs...",
    "error": "Erreur",
    "booksLoadError": "Erreur lors du chargement des livres",
    "offersLoadError": "Erreur lors du chargement des offres",
    "packsLoadError": "Erreur lors du chargement des packs",
    "orderError": "Erreur lors de l'envoi de la commande",
    "fillAllFields": "Veuillez remplir tous les champs obligatoires",
    "selectAtLeastOneBook": "Veuillez sélectionner au moins un livre",
    "validEmail": "Veuillez saisir une adresse email valide",
    "minimumSelection": "Veuillez sélectionner au moins {{count}} livres pour commander",
    "mad": "MAD",
    "days": "jours",
    "inStock": "En stock",
    "lowStock": "Stock limité",
    "badge": {
      "new": "Nouveau",
      "hot": "HOT",
      "sale": "Promo",
      "popular": "Populaire"
    }
  },
  "en": {
    "home": "Home",
    "books": "Books",
    "offers": "Offers",
    "packs": "Packs",
    "contact": "Contact",
    "allBooks": "All Books",
    "booksSubtitle": "Discover our book selection and order easily",
    "searchPlaceholder": "Search by title, author or description...",
    "all": "All",
    "price": "Price (MAD)",
    "minPrice": "Minimum",
    "maxPrice": "Maximum",
    "clearFilters": "Clear filters",
    "available": "Available",
    "unavailable": "Unavailable",
    "page": "Page",
    "of": "of",
    "totalBooks": "books in total",
    "previous": "Previous",
    "next": "Next",
    "booksSelected": "book(s) selected",
    "orderBooks": "Order books",
    "finalizeOrder": "Finalize your order",
    "summary": "Summary",
    "total": "Total",
    "firstName": "First name",
    "lastName": "Last name",
    "email": "Email",
    "phone": "Phone",
    "address": "Delivery address",
    "city": "City",
    "additionalNotes": "Additional notes (optional)",
    "cancel": "Cancel",
    "confirmOrder": "Confirm order",
    "sending": "Sending...",
    "orderSuccess": "Order sent successfully!",
    "emailConfirmation": "You will receive a confirmation by email.",
    "currentOffers": "Current offers",
    "dailyOffers": "Daily offers",
    "save": "Save",
    "expiredOffer": "Offer expired",
    "remainingDays": "Only {{count}} days left!",
    "outOfStock": "Out of stock",
    "featured": "Featured",
    "thematicPacks": "Thematic packs",
    "viewPack": "View pack",
    "noBooksFound": "No books found",
    "changeSearchCriteria": "Try adjusting your search criteria",
    "noOffersAvailable": "No offers available right now",
    "noPacksAvailable": "No packs available",
    "loading": "Loading...",
    "loadingBooks": "Loading books...",
    "loadingOffers": "Loading offers...",
    "loadingPacks": "Loading packs...",
    "error": "Error",
    "booksLoadError": "Error while loading books",
    "offersLoadError": "Error while loading offers",
    "packsLoadError": "Error while loading packs",
    "orderError": "Error while sending the order",
    "fillAllFields": "Please fill in all required fields",
    "selectAtLeastOneBook": "Please select at least one book",
    "validEmail": "Please enter a valid email address",
    "minimumSelection": "Please select at least {{count}} books to order",
    "mad": "MAD",
    "days": "days",
    "inStock": "In stock",
    "lowStock": "Low stock",
    "badge": {
      "new": "New",
      "hot": "Hot",
      "sale": "Sale",
      "popular": "Popular"
    }
  }
}"#;
