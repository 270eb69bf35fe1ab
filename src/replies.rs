//! Canned reply texts and the demo partner directory.

use rand::seq::SliceRandom;
use teloxide::utils::html;

use crate::config::Persona;
use crate::intent::Intent;
use crate::onboarding::{summarize, OnboardingData};

const GREETINGS: &[&str] = &[
    "Merhaba! Nasıl yardımcı olabilirim?",
    "Selam! Bugün size nasıl yardımcı olabilirim?",
    "Merhaba! Bunder Bot hizmetinizde. Nasıl yardımcı olabilirim?",
];

const HELP: &[&str] = &[
    "Size şu konularda yardımcı olabilirim:\n- İş ortaklarıyla bağlantı kurma\n- Şirket bilgilerinizi yönetme\n- Potansiyel ortaklar hakkında bilgi alma\n\nLütfen ne tür bir yardıma ihtiyacınız olduğunu belirtin.",
    "Bunder Bot şunları yapabilir:\n- İş ortaklarıyla iletişim kurmanıza yardımcı olur\n- Şirket profilinizi yönetir\n- Potansiyel iş ortakları bulur\n\nDaha spesifik bir konuda yardım ister misiniz?",
];

const ABOUT: &[&str] = &[
    "Ben Bunder Bot, işletmenize potansiyel iş ortakları bulmanıza yardımcı olmak için geliştirilmiş bir asistanım. Şirket profilinizi oluşturabilir ve benzer hedeflere sahip firmalarla bağlantı kurmanızı sağlayabilirim.",
    "Adım Bunder Bot. Amacım şirketlerin birbirleriyle iş ortaklığı kurmalarını kolaylaştırmak. Şirket bilgilerinizi kaydetmeme izin verirseniz, size uygun potansiyel iş ortakları önerebilirim.",
];

const HOW_IT_WORKS: &[&str] = &[
    "Sistem şöyle çalışır:\n1. Şirket bilgilerinizi kaydedersiniz\n2. İş hedeflerinizi ve ortak türünü belirtirsiniz\n3. Sistem size uygun eşleşmeleri bulur\n4. İletişime geçmek istediğiniz şirketlerle bağlantı kurarsınız",
    "Bot çalışma prensibi:\n1. Önce şirket profilinizi oluşturursunuz\n2. Hangi sektörde ve ne tür ortaklar aradığınızı belirtirsiniz\n3. Bot size uygun eşleşmeleri gösterir\n4. Beğendiğiniz şirketlerle iletişime geçebilirsiniz",
];

const UNKNOWN: &[&str] = &[
    "Üzgünüm, bu konuda henüz bilgim yok. Size nasıl yardımcı olabilirim?",
    "Bu konuda yeterli bilgim yok maalesef. Başka nasıl yardımcı olabilirim?",
];

pub const GENERIC_ERROR: &str = "Üzgünüm, bir hata oluştu. Lütfen tekrar deneyin.";
pub const GEMINI_MODE: &str = "Gemini AI modundasınız. Sormak istediğiniz soruyu yazabilirsiniz.";
pub const GEMINI_PREPARING: &str = "Gemini API yanıtınız hazırlanıyor...";
pub const CLEARED: &str = "Sohbet geçmişiniz temizlendi. Yeni bir konuşmaya başlayabilirsiniz.";
pub const WEATHER_DISABLED: &str =
    "Üzgünüm, hava durumu servisi şu anda yapılandırılmamış. Lütfen daha sonra tekrar deneyin.";
pub const ONBOARDING_INTRO: &str =
    "Let's set up your company profile. I will ask you a few questions, one at a time.";

/// A random canned reply for `intent`.
pub fn canned(intent: Intent) -> &'static str {
    let options = match intent {
        Intent::Greeting => GREETINGS,
        Intent::Help => HELP,
        Intent::About => ABOUT,
        Intent::HowItWorks => HOW_IT_WORKS,
        Intent::Unknown => UNKNOWN,
    };
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(UNKNOWN[0])
}

/// Fallback appended to canned text when the AI call failed.
pub fn ai_fallback() -> String {
    format!("{} (Gemini error)", canned(Intent::Unknown))
}

/// Question sent to the AI for an informational command in the weather persona.
pub fn ai_question(intent: Intent) -> &'static str {
    match intent {
        Intent::About => "Bunder bot hakkında bilgi ver",
        Intent::HowItWorks => "Bunder bot nasıl çalışır, kısaca anlat",
        _ => "Bunder bot için yardım bilgisi ver",
    }
}

/// Fixed fallback when the AI cannot answer an informational command.
pub fn weather_info_fallback(intent: Intent) -> &'static str {
    match intent {
        Intent::About => {
            "Ben Gemini AI destekli bir Telegram botuyum. Her türlü sorunuza yanıt verebilirim."
        }
        Intent::HowItWorks => {
            "Bir şehir adıyla /weather veya /forecast komutunu gönderin, size güncel hava durumunu getireyim."
        }
        _ => "Bot Gemini AI destekli bir asistanıdır. İstediğiniz soruyu sorabilirsiniz.",
    }
}

pub fn welcome(persona: Persona) -> &'static str {
    match persona {
        Persona::Partners => {
            "Merhaba! Bunder Telegram Bot'una hoş geldiniz! 👋\n\n\
             Bu bot, potansiyel iş ortaklarıyla bağlantı kurmanıza yardımcı olacak. \
             Aşağıdaki komutları kullanabilirsiniz:\n\n\
             /help - Yardım bilgisi\n\
             /about - Bot hakkında bilgi\n\
             /howitworks - Nasıl çalışır\n\
             /partners - Örnek iş ortakları\n\
             /onboard - Şirket profilinizi oluşturun"
        }
        Persona::Weather => {
            "Merhaba! Hava Durumu Bilgi Botuna hoş geldiniz! 👋\n\n\
             Bu bot, size güncel hava durumu bilgilerini sunacaktır. \
             Aşağıdaki komutları kullanabilirsiniz:\n\n\
             /help - Yardım bilgisi\n\
             /about - Bot hakkında bilgi\n\
             /weather <şehir> - Güncel hava durumu\n\
             /forecast <şehir> - 5 günlük tahmin\n\n\
             Hangi şehrin hava durumunu öğrenmek istersiniz?"
        }
    }
}

pub fn weather_usage(command: &str) -> String {
    format!("Lütfen bir şehir adı yazın. Örnek: /{} İstanbul", command)
}

pub fn onboarding_complete(data: &OnboardingData) -> String {
    format!(
        "Thank you! Your onboarding is complete.\n\nHere is what you told us:\n{}",
        summarize(data)
    )
}

/// Demo partner company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Company {
    pub name: &'static str,
    pub industry: &'static str,
    pub region: &'static str,
    pub size: &'static str,
    pub interests: &'static str,
}

pub const COMPANIES: &[Company] = &[
    Company {
        name: "TechSoft",
        industry: "Yazılım",
        region: "İstanbul",
        size: "Orta",
        interests: "Teknoloji ortaklıkları",
    },
    Company {
        name: "GreenEnergy",
        industry: "Enerji",
        region: "Ankara",
        size: "Büyük",
        interests: "Yenilenebilir enerji projeleri",
    },
    Company {
        name: "LogiTrans",
        industry: "Lojistik",
        region: "İzmir",
        size: "Orta",
        interests: "Tedarik zinciri optimizasyonu",
    },
    Company {
        name: "FinanceHub",
        industry: "Finans",
        region: "İstanbul",
        size: "Küçük",
        interests: "Fintech çözümleri",
    },
    Company {
        name: "EcoFarm",
        industry: "Tarım",
        region: "Antalya",
        size: "Küçük",
        interests: "Sürdürülebilir tarım",
    },
];

/// Callback payload prefix for company buttons.
pub const COMPANY_CALLBACK_PREFIX: &str = "company_";

/// First company whose name contains `text`, or whose name `text` contains.
/// Case-insensitive.
pub fn find_company(text: &str) -> Option<&'static Company> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    COMPANIES.iter().find(|c| {
        let name = c.name.to_lowercase();
        name.contains(&needle) || needle.contains(&name)
    })
}

/// Company named exactly `name` (as carried in callback data).
pub fn company_by_name(name: &str) -> Option<&'static Company> {
    COMPANIES.iter().find(|c| c.name == name)
}

pub fn partners_list() -> String {
    let mut out = String::from("İşte size uygun olabilecek örnek iş ortakları:\n\n");
    for (i, c) in COMPANIES.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   - Sektör: {}\n   - Konum: {}\n   - Büyüklük: {}\n   - İlgi Alanları: {}\n\n",
            i + 1,
            html::bold(c.name),
            html::escape(c.industry),
            html::escape(c.region),
            html::escape(c.size),
            html::escape(c.interests),
        ));
    }
    out.push_str("Herhangi bir şirket hakkında daha fazla bilgi için şirket adını yazabilirsiniz.");
    out
}

pub fn company_detail(c: &Company) -> String {
    format!(
        "{} hakkında detaylı bilgi:\n\n\
         🏢 {}: {}\n\
         🔍 {}: {}\n\
         📍 {}: {}\n\
         📊 {}: {}\n\
         🤝 {}: {}\n\n\
         Bu şirketle iletişime geçmek ister misiniz? (Evet/Hayır)",
        html::bold(c.name),
        html::bold("Şirket"),
        html::escape(c.name),
        html::bold("Sektör"),
        html::escape(c.industry),
        html::bold("Konum"),
        html::escape(c.region),
        html::bold("Şirket Büyüklüğü"),
        html::escape(c.size),
        html::bold("İşbirliği İlgi Alanları"),
        html::escape(c.interests),
    )
}

/// Yes-like answers: contains "evet" or "yes", or is exactly "e".
pub fn is_affirmative(text: &str) -> bool {
    let answer = text.trim().to_lowercase();
    answer.contains("evet") || answer.contains("yes") || answer == "e"
}

pub fn contact_requested(company: &str) -> String {
    format!(
        "Harika! {} ile iletişim talebiniz iletildi. \
         En kısa sürede sizinle iletişime geçecekler.\n\n\
         Başka bir konuda yardıma ihtiyacınız var mı?",
        html::bold(company)
    )
}

pub fn contact_declined() -> &'static str {
    "Anlaşıldı. Başka bir şirket hakkında bilgi almak isterseniz, \
     tekrar /partners komutunu kullanabilirsiniz."
}
