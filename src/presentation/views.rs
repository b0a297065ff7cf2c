use crate::application::{
    error::{ErrorReport, HttpError},
    pagination::ListWindow,
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "folio::presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(template: ErrorTemplate) -> Response {
    let mut response = render_template_response(template, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "folio::presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct AlternateLinkView {
    pub hreflang: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub author: String,
    pub canonical: String,
    pub alternates: Vec<AlternateLinkView>,
    pub atom_url: String,
    pub og_type: &'static str,
    pub og_title: String,
    pub og_locale: String,
    pub og_image: String,
    pub published_time: Option<String>,
    pub robots: &'static str,
    pub baidu_verification: Option<String>,
}

#[derive(Clone)]
pub struct NavbarLinkView {
    pub href: String,
    pub label: String,
    pub icon_svg: String,
}

#[derive(Clone)]
pub struct LocaleToggleView {
    pub label: String,
    pub href: String,
    /// Locale-less path used as the scroll-restore key.
    pub scroll_path: String,
    pub disabled: bool,
    pub tooltip: String,
}

#[derive(Clone)]
pub struct NavbarView {
    pub links: Vec<NavbarLinkView>,
    pub toggle: LocaleToggleView,
}

#[derive(Clone)]
pub struct LinkView {
    pub href: String,
    pub label: String,
    /// Opens in a new tab with `rel="noopener noreferrer"`.
    pub external: bool,
}

#[derive(Clone)]
pub struct SocialLinkView {
    pub href: String,
    pub label: String,
    pub icon_svg: String,
    pub external: bool,
}

#[derive(Clone)]
pub struct FooterSectionView {
    pub title: String,
    pub links: Vec<LinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub quick_navigation: FooterSectionView,
    pub connect_title: String,
    pub socials: Vec<SocialLinkView>,
    pub resources: FooterSectionView,
    pub discover: FooterSectionView,
    pub contact: FooterSectionView,
    pub copyright: String,
    pub all_rights_reserved: String,
    pub legal: Vec<LinkView>,
    pub last_updated: Option<String>,
    pub modified_from_label: String,
    pub repository: Option<LinkView>,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub lang: String,
    pub meta: PageMetaView,
    pub navbar: NavbarView,
    pub footer: FooterView,
    /// Serialized JSON-LD documents, already safe to embed in `<script>`.
    pub json_ld: Vec<String>,
}

impl LayoutChrome {
    pub fn with_json_ld(mut self, script: String) -> Self {
        self.json_ld.push(script);
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub lang: String,
    pub meta: PageMetaView,
    pub navbar: NavbarView,
    pub footer: FooterView,
    pub json_ld: Vec<String>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            lang: chrome.lang,
            meta: chrome.meta,
            navbar: chrome.navbar,
            footer: chrome.footer,
            json_ld: chrome.json_ld,
            content,
        }
    }
}

pub struct HeroView {
    pub name: String,
    /// The name as displayed: given then family name, or a single run
    /// with the family name first for Chinese.
    pub name_segments: Vec<String>,
    pub initials: String,
    pub subtitle: String,
    pub headline_lines: Vec<String>,
    pub avatar_url: String,
}

#[derive(Clone)]
pub struct NewsItemView {
    pub date: String,
    pub title_html: String,
    pub content_html: String,
}

#[derive(Clone)]
pub struct ProjectLinkView {
    pub kind: String,
    pub href: String,
    pub icon_svg: String,
}

#[derive(Clone)]
pub struct ProjectCardView {
    pub title: String,
    pub href: Option<String>,
    pub dates: String,
    pub description_html: String,
    pub technologies: Vec<String>,
    pub authors_html: Option<String>,
    pub links: Vec<ProjectLinkView>,
    pub image: Option<String>,
    pub video: Option<String>,
}

pub struct ProjectSectionView {
    pub anchor: &'static str,
    pub label: String,
    pub title: String,
    pub scholar: Option<LabelledLinkView>,
    pub window: ListWindow<ProjectCardView>,
}

/// Lead-in text followed by a link, e.g. "View all publications on Google Scholar".
pub struct LabelledLinkView {
    pub text: String,
    pub link: LinkView,
}

pub struct SkillsView {
    pub title: String,
    pub skills: Vec<String>,
}

pub struct ResumeEntryView {
    pub title: String,
    pub href: Option<String>,
    pub logo_url: String,
    pub initial: String,
    pub subtitle: String,
    pub period: String,
    pub badges: Vec<String>,
    pub location: Option<String>,
    pub description_html: String,
}

pub struct ResumeSectionView {
    pub title: String,
    pub entries: Vec<ResumeEntryView>,
}

#[derive(Clone)]
pub struct AwardView {
    pub year: u32,
    pub title: String,
}

#[derive(Clone)]
pub struct TalkView {
    pub host: String,
    pub url: String,
    pub date: String,
    pub title: String,
    pub logo_url: Option<String>,
}

pub struct TeachingView {
    pub date: String,
    pub title: String,
    pub location: String,
}

pub struct ServicesView {
    pub title: String,
    pub conferences_label: String,
    pub conferences: Vec<String>,
    pub journals_label: String,
    pub journals: Vec<String>,
    pub teaching_label: String,
    pub teaching: Vec<TeachingView>,
}

pub struct WindowSectionView<T> {
    pub title: String,
    pub window: ListWindow<T>,
}

pub struct ContactView {
    pub label: String,
    pub heading: String,
    pub description: String,
    pub email_href: Option<String>,
    pub via_email: String,
    pub prompts: Vec<String>,
    pub coffee_chat: Option<LabelledLinkView>,
}

pub struct HomeView {
    pub hero: HeroView,
    pub socials: Vec<SocialLinkView>,
    pub about_title: String,
    pub bio_html: String,
    pub show_all: String,
    pub news: Option<WindowSectionView<NewsItemView>>,
    pub projects: Option<ProjectSectionView>,
    pub publications: Option<ProjectSectionView>,
    pub skills: Option<SkillsView>,
    pub education: Option<ResumeSectionView>,
    pub work: Option<ResumeSectionView>,
    pub awards: Option<WindowSectionView<AwardView>>,
    pub services: Option<ServicesView>,
    pub talks: Option<WindowSectionView<TalkView>>,
    pub contact: ContactView,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeView>,
}

pub struct PostCardView {
    pub href: String,
    pub title: String,
    pub date: String,
    pub iso_date: String,
    pub summary: String,
}

pub struct BlogListView {
    pub title: String,
    pub tagline: String,
    pub read_more: String,
    pub posts: Vec<PostCardView>,
}

#[derive(Template)]
#[template(path = "blog_list.html")]
pub struct BlogListTemplate {
    pub view: LayoutContext<BlogListView>,
}

pub struct TocItemView {
    pub id: String,
    pub text: String,
    pub level: u8,
}

pub struct TocView {
    pub title: String,
    pub empty: String,
    pub toggle: String,
    pub close: String,
    pub items: Vec<TocItemView>,
}

pub struct PostView {
    pub title: String,
    pub date: String,
    pub iso_date: String,
    pub reading_time: String,
    pub view_path: String,
    pub body_html: String,
    pub toc: TocView,
    pub blog_href: String,
    pub blog_label: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostView>,
}

pub struct LegalSectionView {
    pub title: String,
    pub description: String,
    pub items: Vec<String>,
    pub note: Option<String>,
}

pub struct LegalView {
    pub title: String,
    pub last_updated: Option<String>,
    pub sections: Vec<LegalSectionView>,
}

#[derive(Template)]
#[template(path = "legal.html")]
pub struct LegalTemplate {
    pub view: LayoutContext<LegalView>,
}

pub struct ErrorPageView {
    pub code: String,
    pub title: String,
    pub message: String,
    pub primary_action: ErrorAction,
    pub secondary_action: Option<ErrorAction>,
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
