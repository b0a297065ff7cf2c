use axum::http::StatusCode;
use tracing::{debug, warn};

use crate::{
    application::{
        chrome::{ChromeService, social_link_view},
        dates::{format_date, today},
        error::HttpError,
        jsonld,
        metadata::PageMeta,
        pagination::{
            AWARDS_POLICY, DisplayPolicy, ListWindow, NEWS_POLICY, PROJECTS_POLICY,
            PUBLICATIONS_POLICY, TALKS_POLICY,
        },
        render::{RenderRequest, RenderService, render_service},
        site::{SiteContext, resolve_icon},
    },
    domain::{
        collections::{
            AwardItem, EducationItem, LegalSection, NewsItem, ProjectItem, TalkItem, TeachingItem,
            WorkItem,
        },
        dictionary::Dictionary,
        icons::Icon,
        locale::Locale,
    },
    presentation::views::{
        AwardView, BlogListTemplate, BlogListView, ContactView, ErrorAction, ErrorPageView,
        ErrorTemplate, HeroView, HomeTemplate, HomeView, LabelledLinkView,
        LayoutContext, LegalSectionView, LegalTemplate, LegalView, LinkView, NewsItemView,
        PostCardView, PostTemplate, PostView, ProjectCardView, ProjectLinkView,
        ProjectSectionView, ResumeEntryView, ResumeSectionView, ServicesView, SkillsView,
        TalkView, TeachingView, TocItemView, TocView, WindowSectionView,
    },
};

const SOURCE: &str = "folio::application::page::PageService";

/// The two dictionary-driven legal pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalPage {
    PrivacyPolicy,
    TermsOfService,
}

impl LegalPage {
    pub fn path(self) -> &'static str {
        match self {
            LegalPage::PrivacyPolicy => "/privacy-policy",
            LegalPage::TermsOfService => "/terms-of-service",
        }
    }

    fn key(self) -> &'static str {
        match self {
            LegalPage::PrivacyPolicy => "privacyPolicy",
            LegalPage::TermsOfService => "termsOfService",
        }
    }
}

/// Builds the view models for every HTML route.
#[derive(Clone)]
pub struct PageService {
    context: SiteContext,
    chrome: ChromeService,
}

impl PageService {
    pub fn new(context: SiteContext) -> Self {
        let chrome = ChromeService::new(context.clone());
        Self { context, chrome }
    }

    pub fn home(&self, locale: &Locale) -> Result<HomeTemplate, HttpError> {
        let dictionary = self.context.dictionary(locale);
        let show_all = dictionary.text("showAll");

        let bio_html = render_service()
            .render(&RenderRequest::new(dictionary.text_or("bioMarkdown", "")))
            .map_err(|err| {
                HttpError::from_error(
                    SOURCE,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to render biography",
                    &err,
                )
            })?
            .html;

        let socials = self
            .context
            .social_links(locale)
            .into_iter()
            .filter(|link| link.content)
            .map(social_link_view)
            .collect();

        let view = HomeView {
            hero: self.hero(locale, dictionary),
            socials,
            about_title: dictionary.text("sections.about"),
            bio_html,
            show_all,
            news: window_section(
                dictionary.text("sections.news.title"),
                dictionary
                    .collection::<NewsItem>("news")
                    .into_iter()
                    .map(|item| NewsItemView {
                        date: item.date,
                        title_html: inline_markdown(&item.title),
                        content_html: inline_markdown(&item.content),
                    })
                    .collect(),
                NEWS_POLICY,
            ),
            projects: self.project_section(
                "projects",
                dictionary.text("sections.selectedProjects"),
                dictionary.text("sections.checkOutLatestWork"),
                None,
                dictionary.collection("projects"),
            ),
            publications: self.project_section(
                "publications",
                dictionary.text("sections.research"),
                dictionary.text("sections.publications.title"),
                self.scholar_link(locale, dictionary),
                dictionary.collection("publications"),
            ),
            skills: skills(dictionary),
            education: resume_section(
                dictionary.text("sections.education"),
                dictionary
                    .collection::<EducationItem>("education")
                    .into_iter()
                    .map(education_entry)
                    .collect(),
            ),
            work: resume_section(
                dictionary.text("sections.workExperience"),
                dictionary
                    .collection::<WorkItem>("work")
                    .into_iter()
                    .map(work_entry)
                    .collect(),
            ),
            awards: window_section(
                dictionary.text("sections.awards"),
                dictionary
                    .collection::<AwardItem>("awards")
                    .into_iter()
                    .map(|award| AwardView {
                        year: award.year,
                        title: award.title,
                    })
                    .collect(),
                AWARDS_POLICY,
            ),
            services: services(dictionary),
            talks: window_section(
                dictionary.text("sections.invitedTalks.title"),
                sorted_talks(dictionary.collection("invitedTalks")),
                TALKS_POLICY,
            ),
            contact: self.contact(locale, dictionary),
        };

        let meta = PageMeta::new(locale, "/").build(&self.context);
        let chrome = self
            .chrome
            .build(locale, "/", meta, true)
            .with_json_ld(jsonld::to_script(&jsonld::person(&self.context, locale)));

        Ok(HomeTemplate {
            view: LayoutContext::new(chrome, view),
        })
    }

    pub fn blog_list(&self, locale: &Locale) -> BlogListTemplate {
        let dictionary = self.context.dictionary(locale);
        let posts = self.context.site().list_posts(locale);
        let today = today();

        let cards = posts
            .iter()
            .map(|post| PostCardView {
                href: self
                    .context
                    .locales()
                    .localized_path(locale, &format!("/blog/{}", post.slug)),
                title: post.metadata.title.clone(),
                date: format_date(post.metadata.date, today, locale.date_style()),
                iso_date: post.metadata.date.to_string(),
                summary: post.metadata.summary.clone(),
            })
            .collect();

        let title = dictionary.text("blog.title");
        let meta = PageMeta::new(locale, "/blog")
            .title(title.clone())
            .description(dictionary.text("blogTagline"))
            .build(&self.context);
        let chrome = self
            .chrome
            .build(locale, "/blog", meta, true)
            .with_json_ld(jsonld::to_script(&jsonld::blog_list(
                &self.context,
                locale,
                &posts,
            )));

        BlogListTemplate {
            view: LayoutContext::new(
                chrome,
                BlogListView {
                    title,
                    tagline: dictionary.text("blogTagline"),
                    read_more: dictionary.text("blog.readMore"),
                    posts: cards,
                },
            ),
        }
    }

    /// `None` when no post with `slug` exists in `locale`.
    pub fn post(&self, locale: &Locale, slug: &str) -> Option<PostTemplate> {
        let post = self.context.site().post(slug, locale)?;
        let dictionary = self.context.dictionary(locale);
        let locales = self.context.locales();
        let path = format!("/blog/{}", post.slug);

        let available: Vec<Locale> = self
            .context
            .site()
            .available_locales(slug)
            .into_iter()
            .cloned()
            .collect();
        let translated = available.contains(locales.next_after(locale));
        debug!(target = SOURCE, slug, locale = %locale, translated, "rendering post");

        let meta = PageMeta::new(locale, path.clone())
            .title(post.metadata.title.clone())
            .description(post.metadata.summary.clone())
            .article(post.metadata.date)
            .available_in(available)
            .own_og_image()
            .build(&self.context);
        let chrome = self
            .chrome
            .build(locale, &path, meta, translated)
            .with_json_ld(jsonld::to_script(&jsonld::blog_posting(&self.context, post)));

        let reading_minutes = post.reading_minutes.max(1);
        let view = PostView {
            title: post.metadata.title.clone(),
            date: format_date(post.metadata.date, today(), locale.date_style()),
            iso_date: post.metadata.date.to_string(),
            reading_time: dictionary.format(
                "blog.readingTime",
                &[("minutes", reading_minutes.to_string())],
            ),
            view_path: locales.localized_path(locale, &path),
            body_html: post.body_html.clone(),
            toc: TocView {
                title: dictionary.text("blog.toc.title"),
                empty: dictionary.text("blog.toc.empty"),
                toggle: dictionary.text("blog.toc.toggle"),
                close: dictionary.text("blog.toc.close"),
                items: post
                    .toc
                    .iter()
                    .map(|entry| TocItemView {
                        id: entry.id.clone(),
                        text: entry.text.clone(),
                        level: entry.level,
                    })
                    .collect(),
            },
            blog_href: locales.localized_path(locale, "/blog"),
            blog_label: dictionary.text("blog.title"),
        };

        Some(PostTemplate {
            view: LayoutContext::new(chrome, view),
        })
    }

    pub fn legal(&self, locale: &Locale, page: LegalPage) -> LegalTemplate {
        let dictionary = self.context.dictionary(locale);
        let key = page.key();
        let title = dictionary.text(&format!("{key}.title"));

        let sections = dictionary
            .entries::<LegalSection>(&format!("{key}.sections"))
            .into_iter()
            .map(|(_, section)| LegalSectionView {
                title: section.title,
                description: section.description,
                items: section.items,
                note: section.note,
            })
            .collect();

        let meta = PageMeta::new(locale, page.path())
            .title(title.clone())
            .build(&self.context);
        let chrome = self.chrome.build(locale, page.path(), meta, true);

        LegalTemplate {
            view: LayoutContext::new(
                chrome,
                LegalView {
                    title,
                    last_updated: dictionary.text_opt(&format!("{key}.lastUpdated")),
                    sections,
                },
            ),
        }
    }

    /// The localized 404 page for a locale-less `path`.
    pub fn not_found(&self, locale: &Locale, path: &str) -> ErrorTemplate {
        let dictionary = self.context.dictionary(locale);
        let locales = self.context.locales();
        let title = dictionary.text_or("notFound.title", "Page Not Found");

        let meta = PageMeta::new(locale, path)
            .title(title.clone())
            .noindex()
            .build(&self.context);
        let chrome = self.chrome.build(locale, path, meta, true);

        let content = ErrorPageView {
            code: "404".to_string(),
            title,
            message: dictionary.text_or(
                "notFound.message",
                "Sorry, we couldn't find the page you're looking for. It might have been moved, deleted, or you entered the wrong URL.",
            ),
            primary_action: ErrorAction {
                href: locales.localized_path(locale, "/"),
                label: dictionary.text_or("notFound.goHome", "Go Home"),
            },
            secondary_action: Some(ErrorAction {
                href: locales.localized_path(locale, "/blog"),
                label: dictionary.text_or("notFound.viewBlog", "View Blog"),
            }),
        };

        ErrorTemplate {
            view: LayoutContext::new(chrome, content),
        }
    }

    fn hero(&self, locale: &Locale, dictionary: &Dictionary) -> HeroView {
        let name = dictionary.text("name.full");
        let name_segments = match (
            dictionary.text_opt("name.given"),
            dictionary.text_opt("name.family"),
        ) {
            (Some(given), Some(family)) if locale.as_str() == "zh" => {
                vec![format!("{family}{given}")]
            }
            (Some(given), Some(family)) => vec![given, family],
            _ => vec![name.clone()],
        };

        HeroView {
            name_segments,
            initials: dictionary.text_or("name.initials", ""),
            subtitle: dictionary.text_or("subtitle", ""),
            headline_lines: dictionary
                .text_or("headline", "")
                .lines()
                .map(str::to_string)
                .collect(),
            avatar_url: self.context.settings().avatar.clone(),
            name,
        }
    }

    fn project_section(
        &self,
        anchor: &'static str,
        label: String,
        title: String,
        scholar: Option<LabelledLinkView>,
        items: Vec<ProjectItem>,
    ) -> Option<ProjectSectionView> {
        if items.is_empty() {
            return None;
        }
        let policy = if anchor == "projects" {
            PROJECTS_POLICY
        } else {
            PUBLICATIONS_POLICY
        };
        let cards = items.into_iter().map(project_card).collect();

        Some(ProjectSectionView {
            anchor,
            label,
            title,
            scholar,
            window: ListWindow::new(cards, policy),
        })
    }

    fn scholar_link(&self, locale: &Locale, dictionary: &Dictionary) -> Option<LabelledLinkView> {
        let scholar = self.context.social_link(locale, "GoogleScholar")?;
        Some(LabelledLinkView {
            text: dictionary.text("sections.viewFullPublications"),
            link: LinkView {
                external: true,
                href: scholar.url,
                label: scholar.name,
            },
        })
    }

    fn contact(&self, locale: &Locale, dictionary: &Dictionary) -> ContactView {
        let coffee_chat = self
            .context
            .social_link(locale, "calendly")
            .map(|calendly| LabelledLinkView {
                text: dictionary.text_or("sections.coffeeChat", "15-minute coffee chat"),
                link: LinkView {
                    external: true,
                    href: calendly.url,
                    label: dictionary.text_or("sections.schedule", "Schedule"),
                },
            });

        ContactView {
            label: dictionary.text_or("sections.contact", "Contact"),
            heading: dictionary.text_or("sections.getInTouch", "Get in Touch"),
            description: dictionary.text_or(
                "sections.contactDescription",
                "Want to chat? Feel free to reach out",
            ),
            email_href: self
                .context
                .social_link(locale, "email")
                .map(|email| email.url),
            via_email: dictionary.text_or("sections.viaEmail", "via email"),
            prompts: vec![
                dictionary.text_or("sections.askQuestions", "Ask questions"),
                dictionary.text_or(
                    "sections.exploreCollaboration",
                    "Explore collaboration opportunities",
                ),
            ],
            coffee_chat,
        }
    }
}

fn window_section<T>(
    title: String,
    items: Vec<T>,
    policy: DisplayPolicy,
) -> Option<WindowSectionView<T>> {
    if items.is_empty() {
        return None;
    }
    Some(WindowSectionView {
        title,
        window: ListWindow::new(items, policy),
    })
}

fn resume_section(title: String, entries: Vec<ResumeEntryView>) -> Option<ResumeSectionView> {
    (!entries.is_empty()).then_some(ResumeSectionView { title, entries })
}

fn skills(dictionary: &Dictionary) -> Option<SkillsView> {
    let skills = dictionary.strings("skills");
    (!skills.is_empty()).then(|| SkillsView {
        title: dictionary.text("sections.skills"),
        skills,
    })
}

fn services(dictionary: &Dictionary) -> Option<ServicesView> {
    let conferences = dictionary.strings("reviewerConferences");
    let journals = dictionary.strings("reviewerJournals");
    let teaching: Vec<TeachingView> = dictionary
        .collection::<TeachingItem>("teaching")
        .into_iter()
        .map(|item| TeachingView {
            date: item.date,
            title: item.title,
            location: item.location,
        })
        .collect();

    if conferences.is_empty() && journals.is_empty() && teaching.is_empty() {
        return None;
    }

    Some(ServicesView {
        title: dictionary.text("sections.academicServices"),
        conferences_label: dictionary.text("sections.teaching.reviewerConferencesLabel"),
        conferences,
        journals_label: dictionary.text("sections.teaching.reviewerJournalsLabel"),
        journals,
        teaching_label: dictionary.text("sections.teaching.teachingLabel"),
        teaching,
    })
}

fn project_card(item: ProjectItem) -> ProjectCardView {
    ProjectCardView {
        title: item.title,
        href: item.href.filter(|href| !href.is_empty()),
        dates: item.dates,
        description_html: inline_markdown(&item.description),
        technologies: item.technologies,
        authors_html: item
            .authors
            .filter(|authors| !authors.is_empty())
            .map(|authors| inline_markdown(&authors)),
        links: item
            .links
            .into_iter()
            .map(|link| ProjectLinkView {
                icon_svg: resolve_icon(&link.icon, Icon::Globe).svg("link-icon"),
                kind: link.kind,
                href: link.href,
            })
            .collect(),
        image: item.image.filter(|image| !image.is_empty()),
        video: item.video.filter(|video| !video.is_empty()),
    }
}

/// Render short dictionary prose; text the renderer rejects is shown escaped.
fn inline_markdown(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    match render_service().render(&RenderRequest::new(text)) {
        Ok(output) => output.html,
        Err(err) => {
            warn!(target = SOURCE, error = %err, "rendering dictionary prose as plain text");
            ammonia::clean_text(text)
        }
    }
}

fn initial_of(name: &str) -> String {
    name.chars().next().map(String::from).unwrap_or_default()
}

fn education_entry(item: EducationItem) -> ResumeEntryView {
    ResumeEntryView {
        initial: initial_of(&item.school),
        href: item.href.filter(|href| !href.is_empty()),
        logo_url: item.logo_url,
        subtitle: item.degree,
        period: format!("{} - {}", item.start, item.end),
        badges: Vec::new(),
        location: item.location.filter(|location| !location.is_empty()),
        description_html: String::new(),
        title: item.school,
    }
}

fn work_entry(item: WorkItem) -> ResumeEntryView {
    let end = item.end.unwrap_or_else(|| "Present".to_string());
    ResumeEntryView {
        initial: initial_of(&item.company),
        href: item.href.filter(|href| !href.is_empty()),
        logo_url: item.logo_url,
        subtitle: item.title,
        period: format!("{} - {end}", item.start),
        badges: item.badges,
        location: Some(item.location).filter(|location| !location.is_empty()),
        description_html: inline_markdown(&item.description),
        title: item.company,
    }
}

/// Newest first; dates are `YYYY.MM` strings compared with the dot removed.
fn sorted_talks(mut talks: Vec<TalkItem>) -> Vec<TalkView> {
    talks.sort_by(|a, b| b.date.replace('.', "").cmp(&a.date.replace('.', "")));
    talks
        .into_iter()
        .map(|talk| TalkView {
            logo_url: talk.logo_url.filter(|logo| !logo.is_empty()),
            host: talk.host,
            url: talk.url,
            date: talk.date,
            title: talk.title,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::site::testing::site_context;

    fn service() -> (PageService, SiteContext) {
        let context = site_context(json!({
            "name": { "full": "Ada Lovelace", "given": "Ada", "family": "Lovelace", "initials": "AL" },
            "headline": "Analyst\nWriter",
            "bioMarkdown": "I write **notes**.",
            "showAll": "Show all",
            "social": {
                "GoogleScholar": { "name": "Google Scholar", "url": "https://scholar.example/ada", "icon": "googleScholar" },
                "email": { "name": "Email", "url": "mailto:ada@example.com", "icon": "email", "content": true },
            },
            "news": { "items": [
                { "date": "2025.01", "title": "One", "content": "a" },
                { "date": "2025.02", "title": "Two", "content": "b" },
                { "date": "2025.03", "title": "Three", "content": "c" },
                { "date": "2025.04", "title": "Four", "content": "d" },
                { "date": "2025.05", "title": "Five", "content": "e" },
                { "date": "2025.06", "title": "Six", "content": "f" },
            ] },
            "publications": { "items": [ { "title": "On Engines", "dates": "1843" } ] },
            "invitedTalks": { "items": [
                { "host": "A", "url": "https://a.example", "date": "2023.5", "title": "Old" },
                { "host": "B", "url": "https://b.example", "date": "2024.11", "title": "New" },
            ] },
            "work": { "items": [
                { "company": "Engine Co", "title": "Analyst", "start": "1842", "location": "London" },
            ] },
            "privacyPolicy": {
                "title": "Privacy",
                "lastUpdated": "March 2025",
                "sections": {
                    "collection": { "title": "Collection", "description": "We collect nothing." },
                    "contact": { "title": "Contact", "description": "Write to us.", "items": ["Email"] },
                }
            },
        }));
        (PageService::new(context.clone()), context)
    }

    #[test]
    fn home_builds_only_populated_sections() {
        let (service, context) = service();
        let en = context.locales().default_locale().clone();
        let home = service.home(&en).expect("home").view.content;

        assert_eq!(home.hero.name_segments, vec!["Ada", "Lovelace"]);
        assert_eq!(home.hero.headline_lines, vec!["Analyst", "Writer"]);
        assert!(home.bio_html.contains("<strong>notes</strong>"));
        assert_eq!(home.socials.len(), 1);

        let news = home.news.expect("news");
        assert_eq!(news.window.visible().count(), 5);
        assert!(news.window.shows_control());

        let publications = home.publications.expect("publications");
        assert_eq!(
            publications.scholar.map(|s| s.link.href),
            Some("https://scholar.example/ada".to_string())
        );
        assert!(home.projects.is_none());
        assert!(home.awards.is_none());
        assert!(home.services.is_none());
        assert!(home.education.is_none());

        let work = home.work.expect("work");
        assert_eq!(work.entries[0].period, "1842 - Present");
        assert_eq!(work.entries[0].initial, "E");

        let talks = home.talks.expect("talks");
        let titles: Vec<_> = talks.window.visible().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);

        assert_eq!(home.contact.email_href.as_deref(), Some("mailto:ada@example.com"));
        assert!(home.contact.coffee_chat.is_none());
    }

    #[test]
    fn chinese_hero_puts_family_name_first() {
        let (service, context) = service();
        let zh = context.locales().get("zh").expect("zh").clone();
        let home = service.home(&zh).expect("home").view;

        assert_eq!(home.content.hero.name_segments, vec!["LovelaceAda"]);
        assert_eq!(home.json_ld.len(), 3);
    }

    #[test]
    fn legal_sections_keep_dictionary_order() {
        let (service, context) = service();
        let en = context.locales().default_locale().clone();
        let legal = service.legal(&en, LegalPage::PrivacyPolicy).view;

        assert_eq!(legal.meta.title, "Privacy | Ada Lovelace");
        let titles: Vec<_> = legal.content.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Collection", "Contact"]);
        assert_eq!(legal.content.last_updated.as_deref(), Some("March 2025"));
    }

    #[test]
    fn unknown_posts_are_absent() {
        let (service, context) = service();
        let en = context.locales().default_locale().clone();
        assert!(service.post(&en, "missing").is_none());
    }

    #[test]
    fn not_found_falls_back_to_english_copy() {
        let (service, context) = service();
        let zh = context.locales().get("zh").expect("zh").clone();
        let page = service.not_found(&zh, "/nope").view;

        assert_eq!(page.content.code, "404");
        assert_eq!(page.content.title, "Page Not Found");
        assert_eq!(page.content.primary_action.href, "/zh");
        assert_eq!(page.meta.robots, "noindex, nofollow");
    }
}
