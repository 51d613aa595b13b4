use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{
    Attribute, Data, DeriveInput, ExprPath, Fields, Ident, LitInt, LitStr, Token, Type, parenthesized,
    parse_macro_input,
};

/// Derive the `Persist` trait, declaring every marked member.
///
/// Only fields carrying `#[key(..)]` are persisted. The marker takes an
/// integer key, a string key, or both, plus an optional `custom` flag for
/// types handled only by the registry's `TypeResolver`.
///
/// ```ignore
/// #[derive(Default, Persist)]
/// struct Turret {
///     #[key(0)]
///     yaw: f32,
///     #[key("ammo")]
///     ammo: u32,
///     #[key(2, "target")]
///     target: Option<String>,
///     #[key(3, custom)]
///     handle: AssetHandle,
///     cooldown_left: f32,
/// }
/// ```
///
/// # Properties
///
/// Accessor pairs are declared on the struct. `name`, `ty` and `key(..)` are
/// required. A declaration missing either `get` or `set` is ignored. A bare
/// method name refers to a method on `Self`.
///
/// ```ignore
/// #[derive(Persist)]
/// #[property(name = "heat", ty = f32, get = heat, set = set_heat, key(4, "heat"))]
/// struct Turret { /* ... */ }
/// ```
///
/// # Tuple structs
///
/// Tuple fields are named by their index.
///
/// ```ignore
/// #[derive(Persist)]
/// struct Speed(#[key(0)] pub f32);
/// ```
#[proc_macro_derive(Persist, attributes(key, property))]
pub fn derive_persist(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Persist can only be derived for structs",
            ));
        }
    };

    let mut declarations = Vec::new();
    match &data.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let Some(ident) = &field.ident else { continue };
                if let Some(keys) = key_marker(&field.attrs)? {
                    declarations.push(field_declaration(&ident.to_string(), quote! { #ident }, &field.ty, &keys));
                }
            }
        }
        Fields::Unnamed(fields) => {
            for (i, field) in fields.unnamed.iter().enumerate() {
                if let Some(keys) = key_marker(&field.attrs)? {
                    let idx = syn::Index::from(i);
                    declarations.push(field_declaration(&i.to_string(), quote! { #idx }, &field.ty, &keys));
                }
            }
        }
        Fields::Unit => {}
    }

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("property")) {
        if let Some(property) = PropertyArgs::parse(attr)? {
            declarations.push(property.declaration());
        }
    }

    Ok(quote! {
        impl #impl_generics redlilium_persist::Persist for #name #ty_generics #where_clause {
            fn describe() -> redlilium_persist::PersistType {
                redlilium_persist::PersistType::new::<Self>(#name_str, |members| {
                    let _ = &members;
                    #(#declarations)*
                })
            }

            fn persist_type(&self) -> redlilium_persist::PersistType {
                <Self as redlilium_persist::Persist>::describe()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    })
}

/// Parsed contents of a `key(..)` marker.
#[derive(Default)]
struct KeyArgs {
    index: Option<i64>,
    name: Option<LitStr>,
    custom: bool,
}

impl KeyArgs {
    fn spec(&self) -> TokenStream2 {
        let index = match self.index {
            Some(i) => quote! { ::core::option::Option::Some(#i) },
            None => quote! { ::core::option::Option::None },
        };
        let name = match &self.name {
            Some(s) => quote! { ::core::option::Option::Some(#s) },
            None => quote! { ::core::option::Option::None },
        };
        quote! { redlilium_persist::KeySpec { index: #index, name: #name } }
    }
}

impl Parse for KeyArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = KeyArgs::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(LitInt) || lookahead.peek(Token![-]) {
                let negative = input.parse::<Option<Token![-]>>()?.is_some();
                let lit: LitInt = input.parse()?;
                let magnitude = lit.base10_parse::<i128>()?;
                let value = i64::try_from(if negative { -magnitude } else { magnitude })
                    .map_err(|_| syn::Error::new_spanned(&lit, "integer key does not fit in i64"))?;
                if args.index.is_some() {
                    return Err(syn::Error::new_spanned(lit, "integer key given twice"));
                }
                args.index = Some(value);
            } else if lookahead.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                if args.name.is_some() {
                    return Err(syn::Error::new_spanned(lit, "string key given twice"));
                }
                args.name = Some(lit);
            } else if lookahead.peek(Ident) {
                let ident: Ident = input.parse()?;
                if ident != "custom" {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "expected an integer key, a string key or `custom`",
                    ));
                }
                args.custom = true;
            } else {
                return Err(lookahead.error());
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

fn key_marker(attrs: &[Attribute]) -> syn::Result<Option<KeyArgs>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("key")) else {
        return Ok(None);
    };
    let args: KeyArgs = attr.parse_args()?;
    if args.index.is_none() && args.name.is_none() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[key(..)] needs an integer key, a string key, or both",
        ));
    }
    Ok(Some(args))
}

fn field_declaration(name: &str, access: TokenStream2, ty: &Type, keys: &KeyArgs) -> TokenStream2 {
    let spec = keys.spec();
    let method = if keys.custom {
        quote! { custom_field }
    } else {
        quote! { field }
    };
    quote! {
        members.#method::<Self, #ty>(#name, #spec, |this| &this.#access, |this| &mut this.#access);
    }
}

/// Parsed `#[property(..)]` declaration.
struct PropertyArgs {
    name: LitStr,
    ty: Type,
    get: ExprPath,
    set: ExprPath,
    keys: KeyArgs,
}

impl PropertyArgs {
    /// `None` when the declaration lacks a getter or a setter.
    fn parse(attr: &Attribute) -> syn::Result<Option<Self>> {
        let mut name = None;
        let mut ty = None;
        let mut get = None;
        let mut set = None;
        let mut keys = KeyArgs::default();
        let mut custom = false;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("ty") {
                ty = Some(meta.value()?.parse::<Type>()?);
            } else if meta.path.is_ident("get") {
                get = Some(meta.value()?.parse::<ExprPath>()?);
            } else if meta.path.is_ident("set") {
                set = Some(meta.value()?.parse::<ExprPath>()?);
            } else if meta.path.is_ident("key") {
                let content;
                parenthesized!(content in meta.input);
                keys = content.parse()?;
            } else if meta.path.is_ident("custom") {
                custom = true;
            } else {
                return Err(meta.error("expected `name`, `ty`, `get`, `set`, `key` or `custom`"));
            }
            Ok(())
        })?;

        let name = name.ok_or_else(|| syn::Error::new_spanned(attr, "property needs `name = \"..\"`"))?;
        let ty = ty.ok_or_else(|| syn::Error::new_spanned(attr, "property needs `ty = Type`"))?;
        if keys.index.is_none() && keys.name.is_none() {
            return Err(syn::Error::new_spanned(
                attr,
                "property needs `key(..)` with an integer key, a string key, or both",
            ));
        }
        let (Some(get), Some(set)) = (get, set) else {
            return Ok(None);
        };
        keys.custom |= custom;
        Ok(Some(Self {
            name,
            ty,
            get,
            set,
            keys,
        }))
    }

    fn declaration(&self) -> TokenStream2 {
        let Self {
            name,
            ty,
            get,
            set,
            keys,
        } = self;
        let spec = keys.spec();
        let method = if keys.custom {
            quote! { custom_property }
        } else {
            quote! { property }
        };
        let get = method_path(get);
        let set = method_path(set);
        quote! {
            members.#method::<Self, #ty>(#name, #spec, #get, #set);
        }
    }
}

/// A single identifier names a method on `Self`; longer paths are used as is.
fn method_path(path: &ExprPath) -> TokenStream2 {
    match path.path.get_ident() {
        Some(ident) => quote! { Self::#ident },
        None => quote! { #path },
    }
}
