//! The `aidoku` namespace: constructors for domain records.
//!
//! Every record is stored as one descriptor. A missing id fails the whole
//! construction; every other field falls back to its default.

use wasmtime::{ FuncType, Linker, Val, ValType };

use crate::context::SourceContext ;
use crate::descriptor::{ Descriptor, INVALID_DESCRIPTOR };
use crate::memory::GuestMemory ;
use crate::models::{ Chapter, ContentRating, DeepLink, Manga, MangaStatus, MangaViewer, Page };
use crate::value::{ Record, Value };
use super::{ Ctx, read_string };



pub const NAMESPACE: &str = "aidoku" ;

/// `create_manga` takes more parameters than typed host functions support.
const CREATE_MANGA_PARAMS: usize = 20 ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {

	let create_manga_type = FuncType::new(
		linker.engine(),
		std::iter::repeat_n( ValType::I32, CREATE_MANGA_PARAMS ),
		[ ValType::I32 ],
	);
	linker.func_new( NAMESPACE, "create_manga", create_manga_type, | mut caller, params, results | {
		let params = params.iter().map(| param | param.i32().unwrap_or_default() ).collect::<Vec<_>>();
		let descriptor = create_manga( &mut caller, &params )?;
		if let Some( result ) = results.first_mut() { *result = Val::I32( descriptor ) }
		Ok(())
	})?;

	declare_imports!( linker, NAMESPACE, [
		( "create_manga_result", create_manga_result ),
		( "create_chapter", create_chapter ),
		( "create_page", create_page ),
		( "create_deeplink", create_deeplink ),
	])

}

/// Parameters, in order: id, cover, title, author, artist, description and url as
/// pointer/length pairs, then the tag pointer array, the tag length array, the
/// tag count, and the status, rating and viewer codes.
fn create_manga( caller: &mut Ctx<'_>, params: &[i32] ) -> wasmtime::Result<Descriptor> {

	let &[
		id, id_len,
		cover, cover_len,
		title, title_len,
		author, author_len,
		artist, artist_len,
		description, description_len,
		url, url_len,
		tags, tag_lens, tag_count,
		status, nsfw, viewer,
	] = params else { return Ok( INVALID_DESCRIPTOR ) };

	if id_len <= 0 { return Ok( INVALID_DESCRIPTOR ) }

	let manga = Manga {
		source_id: caller.data().source_id().to_string(),
		id: read_string( caller, id, id_len )?,
		title: read_string( caller, title, title_len )?,
		author: read_string( caller, author, author_len )?,
		artist: read_string( caller, artist, artist_len )?,
		description: read_string( caller, description, description_len )?,
		tags: read_tags( caller, tags, tag_lens, tag_count )?,
		cover: read_string( caller, cover, cover_len )?,
		url: read_string( caller, url, url_len )?,
		status: MangaStatus::from_code( status ),
		nsfw: ContentRating::from_code( nsfw ),
		viewer: MangaViewer::from_code( viewer ),
	};

	Ok( caller.data().host().heap.store( Record::Manga( manga ).into() ))

}

/// Reads `count` strings given parallel arrays of pointers and byte lengths.
#[allow( clippy::cast_possible_wrap )]
fn read_tags( caller: &mut Ctx<'_>, pointers: i32, lengths: i32, count: i32 ) -> wasmtime::Result<Vec<String>> {
	if count <= 0 { return Ok( Vec::new() ) }
	let memory = GuestMemory::of( caller )?;
	let pointers = memory.read_u32_array( &*caller, pointers, count )?;
	let lengths = memory.read_u32_array( &*caller, lengths, count )?;
	let tags = pointers.into_iter().zip( lengths )
		.map(|( ptr, len )| read_string( caller, ptr as i32, len as i32 ))
		.collect::<Result<Vec<_>, _>>()?;
	Ok( tags )
}

/// Wraps an array of manga. Releasing the result releases the array and,
/// through it, every manga the array contains.
fn create_manga_result( caller: Ctx<'_>, manga: Descriptor, has_more: i32 ) -> Descriptor {
	let mut host = caller.data().host();
	if !matches!( host.heap.get( manga ), Some( Value::Array( _ ))) { return INVALID_DESCRIPTOR }
	let result = host.heap.store( Record::MangaPageResult { entries: manga, has_next_page: has_more != 0 }.into() );
	host.heap.add_reference( result, manga );
	result
}

/// Chapters are stamped with the manga being listed and with their position in
/// the current call.
#[allow( clippy::too_many_arguments )]
fn create_chapter(
	mut caller: Ctx<'_>,
	id: i32, id_len: i32,
	name: i32, name_len: i32,
	volume: f32,
	chapter: f32,
	date_updated: f64,
	scanlator: i32, scanlator_len: i32,
	url: i32, url_len: i32,
	lang: i32, lang_len: i32,
) -> wasmtime::Result<Descriptor> {

	if id_len <= 0 { return Ok( INVALID_DESCRIPTOR ) }

	let id = read_string( &mut caller, id, id_len )?;
	let title = read_string( &mut caller, name, name_len )?;
	let scanlator = read_string( &mut caller, scanlator, scanlator_len )?;
	let url = read_string( &mut caller, url, url_len )?;
	let lang = read_string( &mut caller, lang, lang_len )?;

	let context = caller.data();
	let mut host = context.host();
	let source_order = host.chapter_counter ;
	host.chapter_counter = host.chapter_counter.saturating_add( 1 );

	let chapter = Chapter {
		source_id: context.source_id().to_string(),
		id,
		manga_id: host.current_manga.clone().unwrap_or_default(),
		title,
		scanlator,
		url,
		lang,
		chapter_num: chapter,
		volume_num: volume,
		date_updated,
		source_order,
	};

	Ok( host.heap.store( Record::Chapter( chapter ).into() ))

}

fn create_page(
	mut caller: Ctx<'_>,
	index: i32,
	image_url: i32, image_url_len: i32,
	base64: i32, base64_len: i32,
	text: i32, text_len: i32,
) -> wasmtime::Result<Descriptor> {
	let page = Page {
		index,
		image_url: read_string( &mut caller, image_url, image_url_len )?,
		base64: read_string( &mut caller, base64, base64_len )?,
		text: read_string( &mut caller, text, text_len )?,
	};
	Ok( caller.data().host().heap.store( Record::Page( page ).into() ))
}

/// Either side may be absent; descriptors that are not a manga or chapter are ignored.
fn create_deeplink( caller: Ctx<'_>, manga: Descriptor, chapter: Descriptor ) -> Descriptor {
	let mut host = caller.data().host();
	let link = DeepLink {
		manga: match host.heap.get( manga ) {
			Some( Value::Record( record )) => match record.as_ref() {
				Record::Manga( manga ) => Some( manga.clone() ),
				_ => None,
			},
			_ => None,
		},
		chapter: match host.heap.get( chapter ) {
			Some( Value::Record( record )) => match record.as_ref() {
				Record::Chapter( chapter ) => Some( chapter.clone() ),
				_ => None,
			},
			_ => None,
		},
	};
	host.heap.store( Record::DeepLink( link ).into() )
}
