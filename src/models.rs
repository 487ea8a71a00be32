//! Domain records exchanged with sources.
//!
//! Records built by guests through the `aidoku` namespace are stored in the heap
//! as [`Value::Record`]( crate::Value::Record ). Host inputs such as filters and
//! listings are stored as plain Value-ABI objects so that guests can walk them
//! with `std.object_get`.

use serde::{ Serialize, Serializer };



/// Publication status of a manga.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum MangaStatus {
	#[default] Unknown,
	Ongoing,
	Completed,
	Cancelled,
	Hiatus,
}

/// Content rating of a manga.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum ContentRating {
	#[default] Safe,
	Suggestive,
	Nsfw,
}

/// Preferred reader layout of a manga.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum MangaViewer {
	#[default] Default,
	RightToLeft,
	LeftToRight,
	Vertical,
	Scroll,
}

macro_rules! abi_code {
	( $name:ident { $( $code:literal => $variant:ident ),+ $(,)? } ) => {
		impl $name {
			/// Decodes a guest code; unknown codes map to the default variant.
			pub fn from_code( code: i32 ) -> Self {
				match code {
					$( $code => Self::$variant, )+
					_ => Self::default(),
				}
			}

			pub fn code( self ) -> i32 {
				match self { $( Self::$variant => $code, )+ }
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>( &self, serializer: S ) -> Result<S::Ok, S::Error> {
				serializer.serialize_i32( self.code() )
			}
		}
	};
}

abi_code!( MangaStatus { 0 => Unknown, 1 => Ongoing, 2 => Completed, 3 => Cancelled, 4 => Hiatus });
abi_code!( ContentRating { 0 => Safe, 1 => Suggestive, 2 => Nsfw });
abi_code!( MangaViewer { 0 => Default, 1 => RightToLeft, 2 => LeftToRight, 3 => Vertical, 4 => Scroll });

#[derive( Debug, Clone, PartialEq, Default, Serialize )]
#[serde( rename_all = "camelCase" )]
pub struct Manga {
	pub source_id: String,
	pub id: String,
	pub title: String,
	pub author: String,
	pub artist: String,
	pub description: String,
	pub tags: Vec<String>,
	pub cover: String,
	pub url: String,
	pub status: MangaStatus,
	pub nsfw: ContentRating,
	pub viewer: MangaViewer,
}

impl Manga {
	/// A manga carrying only its identity, as passed into `get_manga_details`.
	pub fn new( source_id: impl Into<String>, id: impl Into<String> ) -> Self {
		Self { source_id: source_id.into(), id: id.into(), ..Self::default() }
	}
}

#[derive( Debug, Clone, PartialEq, Default, Serialize )]
#[serde( rename_all = "camelCase" )]
pub struct Chapter {
	pub source_id: String,
	pub id: String,
	pub manga_id: String,
	pub title: String,
	pub scanlator: String,
	pub url: String,
	pub lang: String,
	pub chapter_num: f32,
	pub volume_num: f32,
	/// Milliseconds since the Unix epoch.
	pub date_updated: f64,
	/// Position in the order the source produced chapters during one call.
	pub source_order: i32,
}

impl Chapter {
	/// A chapter carrying only its identity, as passed into `get_page_list`.
	pub fn new( source_id: impl Into<String>, manga_id: impl Into<String>, id: impl Into<String> ) -> Self {
		Self {
			source_id: source_id.into(),
			manga_id: manga_id.into(),
			id: id.into(),
			..Self::default()
		}
	}
}

#[derive( Debug, Clone, PartialEq, Default, Serialize )]
#[serde( rename_all = "camelCase" )]
pub struct Page {
	pub index: i32,
	pub image_url: String,
	pub base64: String,
	pub text: String,
}

#[derive( Debug, Clone, PartialEq, Default, Serialize )]
pub struct DeepLink {
	pub manga: Option<Manga>,
	pub chapter: Option<Chapter>,
}

#[derive( Debug, Clone, PartialEq, Default )]
pub struct MangaPageResult {
	pub manga: Vec<Manga>,
	pub has_next_page: bool,
}

#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct Listing {
	pub name: String,
}

impl Listing {
	pub fn new( name: impl Into<String> ) -> Self { Self { name: name.into() }}

	pub fn to_json( &self ) -> serde_json::Value {
		serde_json::json!({ "name": self.name })
	}
}

/// Sort choice carried by [`Filter::Sort`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct SortSelection {
	pub index: i32,
	pub ascending: bool,
}

/// Search filters handed to `get_manga_list`.
///
/// Every filter is rendered to an object with `type` (the filter-type code) and
/// `name`, plus the variant's own fields.
#[derive( Debug, Clone, PartialEq )]
pub enum Filter {
	Text { name: String, value: String },
	Title( String ),
	Author( String ),
	Check { name: String, id: Option<String>, can_exclude: bool, value: Option<bool> },
	Genre { name: String, id: Option<String>, can_exclude: bool, value: Option<bool> },
	Select { name: String, options: Vec<String>, value: i32 },
	Sort { name: String, options: Vec<String>, can_ascend: bool, value: SortSelection },
	Group { name: String, filters: Vec<Filter> },
}

impl Filter {

	/// Filter-type code understood by sources.
	pub fn type_code( &self ) -> i32 {
		match self {
			Self::Group { .. } => 1,
			Self::Text { .. } => 2,
			Self::Check { .. } => 3,
			Self::Select { .. } => 4,
			Self::Sort { .. } => 5,
			Self::Title( _ ) => 7,
			Self::Author( _ ) => 8,
			Self::Genre { .. } => 9,
		}
	}

	pub fn name( &self ) -> &str {
		match self {
			Self::Title( _ ) => "Title",
			Self::Author( _ ) => "Author",
			Self::Text { name, .. }
			| Self::Check { name, .. }
			| Self::Genre { name, .. }
			| Self::Select { name, .. }
			| Self::Sort { name, .. }
			| Self::Group { name, .. } => name,
		}
	}

	pub fn to_json( &self ) -> serde_json::Value {
		use serde_json::json ;
		let mut object = json!({ "type": self.type_code(), "name": self.name() });
		let extra = match self {
			Self::Text { value, .. } | Self::Title( value ) | Self::Author( value ) => json!({
				"value": value,
				"defaultValue": value,
			}),
			Self::Check { id, can_exclude, value, .. } | Self::Genre { id, can_exclude, value, .. } => json!({
				"id": id,
				"canExclude": can_exclude,
				"value": value,
				"defaultValue": value,
			}),
			Self::Select { options, value, .. } => json!({
				"options": options,
				"value": value,
				"defaultValue": value,
			}),
			Self::Sort { options, can_ascend, value, .. } => {
				let selection = json!({
					"type": 6,
					"name": "",
					"index": value.index,
					"ascending": value.ascending,
				});
				json!({
					"options": options,
					"canAscend": can_ascend,
					"value": selection,
					"defaultValue": selection,
				})
			},
			Self::Group { filters, .. } => json!({
				"filters": filters.iter().map( Filter::to_json ).collect::<Vec<_>>(),
				"value": null,
				"defaultValue": null,
			}),
		};
		if let ( Some( object ), serde_json::Value::Object( extra )) = ( object.as_object_mut(), extra ) {
			object.extend( extra );
		}
		object
	}

}
